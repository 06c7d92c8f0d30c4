//! Post records and their front-matter schema.
//!
//! `PostMeta` is the strict schema a post's YAML front-matter is decoded
//! into; `PostMeta::into_post` applies the defaulting rules and produces
//! the immutable `Post` record the index holds.
//!
//! # Defaults
//!
//! | Field     | Default                      |
//! |-----------|------------------------------|
//! | `slug`    | file name without extension  |
//! | `updated` | `created`                    |
//! | `authors`, `tags`, `attachments` | empty    |
//! | `draft`, `featured` | `false`            |
//!
//! `created` has no default: a post without a valid created date cannot
//! participate in recency ordering and fails the whole load.

use super::error::LoadError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Calendar date format used in front-matter and descriptors.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A display author. Carries no identity beyond the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
}

/// One post document, materialized from a markdown file.
#[derive(Debug, Clone)]
pub struct Post {
    /// Unique human-readable identifier; primary lookup key.
    pub slug: String,
    /// Backing file, re-read when the body is rendered.
    pub source: PathBuf,
    pub title: String,
    pub description: String,
    pub authors: Vec<Author>,
    pub created: NaiveDate,
    pub updated: NaiveDate,
    /// Declaration order is preserved for display; membership tests are
    /// order-insensitive.
    pub tags: Vec<String>,
    /// Drafts are excluded from public listings unless explicitly requested.
    pub draft: bool,
    pub featured: bool,
    pub cover_image: String,
    pub attachments: Vec<String>,
}

impl Post {
    /// Exact (case-sensitive) tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive substring match against title, description, or
    /// any tag.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }
}

/// Strict front-matter schema for post documents.
///
/// Unknown keys are tolerated (hand-authored content accumulates ad-hoc
/// fields); known keys must have the right shape.
#[derive(Debug, Default, Deserialize)]
pub struct PostMeta {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl PostMeta {
    /// Apply defaulting rules and produce a `Post`.
    pub fn into_post(self, source: &Path) -> Result<Post, LoadError> {
        let created = parse_date(source, "created", self.created.as_deref())?;
        let updated = match self.updated.as_deref() {
            Some(value) => parse_date(source, "updated", Some(value))?,
            None => created,
        };

        Ok(Post {
            slug: self
                .slug
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| file_stem(source)),
            source: source.to_path_buf(),
            title: self.title,
            description: self.description,
            authors: into_authors(self.authors),
            created,
            updated,
            tags: self.tags,
            draft: self.draft,
            featured: self.featured,
            cover_image: self.cover_image,
            attachments: self.attachments,
        })
    }
}

/// Wrap plain author names into `Author` values.
pub(super) fn into_authors(names: Vec<String>) -> Vec<Author> {
    names.into_iter().map(|name| Author { name }).collect()
}

/// File name without extension, used as the default slug.
pub(super) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse a required `YYYY-MM-DD` date field.
///
/// Missing and malformed values are distinct errors; both abort the load.
pub(super) fn parse_date(
    file: &Path,
    field: &'static str,
    value: Option<&str>,
) -> Result<NaiveDate, LoadError> {
    let value = value.unwrap_or("").trim();
    if value.is_empty() {
        return Err(LoadError::MissingDate {
            file: file.to_path_buf(),
            field,
        });
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| LoadError::InvalidDate {
        file: file.to_path_buf(),
        field,
        value: value.to_owned(),
        source,
    })
}
