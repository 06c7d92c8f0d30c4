//! Series records and their descriptor schema.
//!
//! A series descriptor is one YAML document. Its `posts` field comes in
//! two forms, and a single descriptor must use one of them consistently:
//!
//! ```yaml
//! # declaration order
//! posts: [intro, setup, advanced]
//!
//! # explicit ranks, sorted before resolution
//! posts:
//!   - slug: advanced
//!     order: 3
//!   - slug: intro
//!     order: 1
//! ```

use super::error::LoadError;
use super::post::{Post, parse_date};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// One ordered grouping of posts.
///
/// Members are shared references: a post belongs to any number of series
/// and the series never owns the post's lifetime. Member order is
/// authoritative display order.
#[derive(Debug, Clone)]
pub struct Series {
    /// Unique identifier, same uniqueness contract as `Post::slug`.
    pub slug: String,
    pub title: String,
    pub description: String,
    pub authors: Vec<super::post::Author>,
    pub created: NaiveDate,
    pub status: String,
    pub cover_image: String,
    pub posts: Vec<Arc<Post>>,
}

impl Series {
    /// A copy of this series with draft members filtered out.
    ///
    /// Always a new value: draft filtering must never narrow the cached
    /// record other callers share.
    pub fn without_drafts(&self) -> Self {
        Self {
            posts: self
                .posts
                .iter()
                .filter(|p| !p.draft)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }
}

/// Strict schema for series descriptors.
#[derive(Debug, Default, Deserialize)]
pub struct SeriesMeta {
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
    pub status: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub posts: MemberList,
}

impl SeriesMeta {
    /// Apply defaulting rules and attach the resolved members.
    pub fn into_series(self, source: &Path, posts: Vec<Arc<Post>>) -> Result<Series, LoadError> {
        Ok(Series {
            slug: self
                .slug
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| super::post::file_stem(source)),
            title: self.title,
            description: self.description,
            authors: super::post::into_authors(self.authors),
            created: parse_date(source, "created", self.created.as_deref())?,
            status: self.status,
            cover_image: self.cover_image,
            posts,
        })
    }
}

/// The two member-list forms. Mixed forms within one descriptor do not
/// match either variant and fail the schema.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MemberList {
    /// Plain slugs; declaration order is the display order.
    Slugs(Vec<String>),
    /// Ranked entries; sorted by `order` before slugs are extracted.
    Ranked(Vec<RankedMember>),
}

/// One ranked member entry.
#[derive(Debug, Deserialize)]
pub struct RankedMember {
    pub slug: String,
    #[serde(default)]
    pub order: i64,
}

impl Default for MemberList {
    fn default() -> Self {
        Self::Slugs(Vec::new())
    }
}

impl MemberList {
    /// Member slugs in authoritative order.
    ///
    /// The sort is stable: ranked entries with equal `order` keep their
    /// declaration order.
    pub fn into_ordered_slugs(self) -> Vec<String> {
        match self {
            Self::Slugs(slugs) => slugs,
            Self::Ranked(mut members) => {
                members.sort_by_key(|m| m.order);
                members.into_iter().map(|m| m.slug).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::post::PostMeta;

    fn make_post(slug: &str, draft: bool) -> Arc<Post> {
        let meta: PostMeta =
            serde_yaml::from_str(&format!("slug: {slug}\ncreated: 2024-01-01\ndraft: {draft}"))
                .unwrap();
        Arc::new(meta.into_post(Path::new(&format!("posts/{slug}.md"))).unwrap())
    }

    #[test]
    fn test_member_list_plain_slugs_keep_declaration_order() {
        let list: MemberList = serde_yaml::from_str("[c, a, b]").unwrap();
        assert_eq!(list.into_ordered_slugs(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_member_list_ranked_sorted_by_order() {
        let list: MemberList = serde_yaml::from_str(
            r#"
            - slug: last
              order: 30
            - slug: first
              order: 10
            - slug: middle
              order: 20
            "#,
        )
        .unwrap();
        assert_eq!(list.into_ordered_slugs(), vec!["first", "middle", "last"]);
    }

    #[test]
    fn test_member_list_ranked_order_defaults_to_zero() {
        let list: MemberList = serde_yaml::from_str(
            r#"
            - slug: b
            - slug: a
              order: -1
            - slug: c
            "#,
        )
        .unwrap();
        // a sorts first; b and c keep declaration order at rank 0
        assert_eq!(list.into_ordered_slugs(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_member_list_mixed_forms_rejected() {
        let result: Result<MemberList, _> = serde_yaml::from_str(
            r#"
            - plain-slug
            - slug: ranked
              order: 1
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_member_list_empty() {
        let list: MemberList = serde_yaml::from_str("[]").unwrap();
        assert!(list.into_ordered_slugs().is_empty());
    }

    #[test]
    fn test_into_series_defaults() {
        let meta: SeriesMeta =
            serde_yaml::from_str("title: Rust Basics\ncreated: 2024-02-01").unwrap();
        let series = meta
            .into_series(Path::new("series/rust-basics.yaml"), Vec::new())
            .unwrap();

        assert_eq!(series.slug, "rust-basics");
        assert_eq!(series.title, "Rust Basics");
        assert_eq!(series.status, "");
        assert!(series.posts.is_empty());
    }

    #[test]
    fn test_into_series_missing_created_is_error() {
        let meta: SeriesMeta = serde_yaml::from_str("title: No Date").unwrap();
        let err = meta
            .into_series(Path::new("series/s.yaml"), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingDate { field: "created", .. }
        ));
    }

    #[test]
    fn test_without_drafts_is_a_copy() {
        let meta: SeriesMeta = serde_yaml::from_str("created: 2024-01-01").unwrap();
        let series = meta
            .into_series(
                Path::new("series/s.yaml"),
                vec![
                    make_post("published", false),
                    make_post("draft", true),
                    make_post("also-published", false),
                ],
            )
            .unwrap();

        let filtered = series.without_drafts();
        let slugs: Vec<_> = filtered.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["published", "also-published"]);

        // the original record is untouched
        assert_eq!(series.posts.len(), 3);
    }
}
