//! Directory scanning and collection loading.
//!
//! Both collections are built in one pass over their source directories:
//!
//! ```text
//! load_posts()                     load_series(posts)
//!     │                                │
//!     ├── collect_files (*.md)        ├── collect_files (*.yaml|*.yml)
//!     ├── par_iter: parse + schema    ├── parse descriptor + schema
//!     ├── skip files without          ├── skip empty documents
//!     │   front-matter                ├── resolve member slugs
//!     └── enforce slug uniqueness     │   (unknown members dropped)
//!                                     └── enforce slug uniqueness
//! ```
//!
//! Scanned paths are sorted before parsing, so scan order (and with it
//! the tie order of every listing) is deterministic across platforms.

use super::error::LoadError;
use super::frontmatter::{is_empty_document, split_front_matter};
use super::post::{Post, PostMeta};
use super::series::{Series, SeriesMeta};
use crate::config::SiteConfig;
use crate::log;
use rayon::prelude::*;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

/// Recognized post document extension.
pub const POST_EXTENSIONS: &[&str] = &["md"];

/// Recognized series descriptor extensions.
pub const SERIES_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Load all posts from the configured posts directory.
///
/// Files without front-matter (or with an empty block) are skipped
/// silently; schema violations, bad dates and duplicate slugs abort the
/// load.
pub fn load_posts(config: &SiteConfig) -> Result<Vec<Arc<Post>>, LoadError> {
    let files = collect_files(&config.content.posts, POST_EXTENSIONS)?;

    let parsed: Vec<Option<Post>> = files
        .par_iter()
        .map(|path| parse_post_file(path))
        .collect::<Result<_, _>>()?;

    let posts: Vec<Arc<Post>> = parsed.into_iter().flatten().map(Arc::new).collect();

    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for post in &posts {
        if let Some(first) = seen.insert(&post.slug, &post.source) {
            return Err(LoadError::DuplicateSlug {
                slug: post.slug.clone(),
                first: first.to_path_buf(),
                second: post.source.clone(),
            });
        }
    }

    Ok(posts)
}

/// Load all series from the configured series directory, resolving member
/// slugs against the loaded posts.
///
/// Descriptors that parse to an empty document are skipped silently;
/// member slugs with no matching post are dropped from that series.
pub fn load_series(
    config: &SiteConfig,
    posts: &[Arc<Post>],
) -> Result<Vec<Series>, LoadError> {
    let files = collect_files(&config.content.series, SERIES_EXTENSIONS)?;
    let by_slug: HashMap<&str, &Arc<Post>> =
        posts.iter().map(|p| (p.slug.as_str(), p)).collect();

    let mut all = Vec::with_capacity(files.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for path in files {
        let Some(series) = parse_series_file(&path, &by_slug)? else {
            continue;
        };
        if let Some(first) = seen.insert(series.slug.clone(), path.clone()) {
            return Err(LoadError::DuplicateSlug {
                slug: series.slug.clone(),
                first,
                second: path,
            });
        }
        all.push(series);
    }

    Ok(all)
}

/// Parse one post file. `Ok(None)` means the file carries no metadata and
/// does not become a post.
fn parse_post_file(path: &Path) -> Result<Option<Post>, LoadError> {
    let content = read_file(path)?;

    let (block, _body) = split_front_matter(&content);
    let Some(block) = block else {
        return Ok(None);
    };

    let value: serde_yaml::Value = serde_yaml::from_str(block)
        .map_err(|err| LoadError::FrontMatter(path.to_path_buf(), err))?;
    if is_empty_document(&value) {
        return Ok(None);
    }

    let meta: PostMeta = serde_yaml::from_value(value)
        .map_err(|err| LoadError::FrontMatter(path.to_path_buf(), err))?;
    meta.into_post(path).map(Some)
}

/// Parse one series descriptor and resolve its members.
fn parse_series_file(
    path: &Path,
    by_slug: &HashMap<&str, &Arc<Post>>,
) -> Result<Option<Series>, LoadError> {
    let content = read_file(path)?;

    let value: serde_yaml::Value = serde_yaml::from_str(&content)
        .map_err(|err| LoadError::Descriptor(path.to_path_buf(), err))?;
    if is_empty_document(&value) {
        return Ok(None);
    }

    let mut meta: SeriesMeta = serde_yaml::from_value(value)
        .map_err(|err| LoadError::Descriptor(path.to_path_buf(), err))?;

    let member_slugs = std::mem::take(&mut meta.posts).into_ordered_slugs();
    let mut members = Vec::with_capacity(member_slugs.len());
    for slug in &member_slugs {
        match by_slug.get(slug.as_str()) {
            Some(post) => members.push(Arc::clone(post)),
            None => {
                log!("content"; "{}: dropping unknown member `{slug}`", path.display());
            }
        }
    }

    meta.into_series(path, members).map(Some)
}

/// Collect files with one of the given extensions, sorted by path.
fn collect_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|err| {
            LoadError::Io(
                dir.to_path_buf(),
                err.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk error")),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|err| LoadError::Io(path.to_path_buf(), err))
}

// ============================================================================
// Tests
// ============================================================================
