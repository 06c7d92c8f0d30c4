//! The content index and its query surface.
//!
//! `ContentIndex` is built exactly once, before the server accepts its
//! first request, and is immutable from then on. There is no ambient
//! global state: whoever serves queries receives the index by reference.
//!
//! Every ordered result has an explicit sort key; directory enumeration
//! order never leaks out:
//!
//! | Query            | Order                                        |
//! |------------------|----------------------------------------------|
//! | `latest_posts`   | `created` descending, ties keep scan order   |
//! | `featured_posts` | scan order (deliberately not date-sorted)    |
//! | series members   | declared member order                        |
//! | `tags`           | alphabetical                                 |

use super::error::LoadError;
use super::loader;
use super::post::Post;
use super::series::Series;
use crate::config::SiteConfig;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Immutable in-memory index of all posts and series.
#[derive(Debug)]
pub struct ContentIndex {
    posts: Vec<Arc<Post>>,
    series: Vec<Series>,
}

/// Positional navigation within a series' ordered member list.
#[derive(Debug, Clone)]
pub struct SeriesNavigation {
    /// Absent when the post is the first member.
    pub previous: Option<Arc<Post>>,
    /// Absent when the post is the last member.
    pub next: Option<Arc<Post>>,
    /// 1-based position within the member list.
    pub position: usize,
    pub total: usize,
}

impl ContentIndex {
    /// Scan both content directories and build the index.
    pub fn load(config: &SiteConfig) -> Result<Self, LoadError> {
        let posts = loader::load_posts(config)?;
        let series = loader::load_series(config, &posts)?;
        Ok(Self { posts, series })
    }

    /// All loaded posts in scan order, drafts included.
    pub fn posts(&self) -> &[Arc<Post>] {
        &self.posts
    }

    /// All loaded series in scan order, members unfiltered.
    pub fn all_series(&self) -> &[Series] {
        &self.series
    }

    /// Look up a post by slug.
    pub fn post(&self, slug: &str) -> Option<&Arc<Post>> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// Look up a series by slug.
    ///
    /// Unless `include_drafts` is set, the returned member list excludes
    /// drafts. The filtered value is a copy; the cached record is never
    /// narrowed by a lookup.
    pub fn series(&self, slug: &str, include_drafts: bool) -> Option<Series> {
        let series = self.series.iter().find(|s| s.slug == slug)?;
        if include_drafts {
            Some(series.clone())
        } else {
            Some(series.without_drafts())
        }
    }

    /// The most recent posts, `created` descending, truncated to `limit`.
    ///
    /// The sort is stable, so posts sharing a created date keep their
    /// relative scan order.
    pub fn latest_posts(&self, limit: usize, include_drafts: bool) -> Vec<Arc<Post>> {
        let mut posts: Vec<_> = self
            .posts
            .iter()
            .filter(|p| include_drafts || !p.draft)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created.cmp(&a.created));
        posts.truncate(limit);
        posts
    }

    /// Posts flagged `featured`, truncated to `limit`.
    ///
    /// No recency sort is applied; featured posts keep scan order.
    pub fn featured_posts(&self, limit: usize, include_drafts: bool) -> Vec<Arc<Post>> {
        self.posts
            .iter()
            .filter(|p| include_drafts || !p.draft)
            .filter(|p| p.featured)
            .take(limit)
            .cloned()
            .collect()
    }

    /// All series whose member list contains the given post.
    pub fn series_containing(&self, post_slug: &str) -> Vec<&Series> {
        self.series
            .iter()
            .filter(|s| s.posts.iter().any(|p| p.slug == post_slug))
            .collect()
    }

    /// Locate a post within a series' ordered member list.
    ///
    /// Positions are computed over the draft-excluded view, so they match
    /// what a visitor sees. Returns `None` when either slug does not
    /// resolve or the post is not a member.
    pub fn navigation(&self, series_slug: &str, post_slug: &str) -> Option<SeriesNavigation> {
        let series = self.series(series_slug, false)?;
        let index = series.posts.iter().position(|p| p.slug == post_slug)?;

        Some(SeriesNavigation {
            previous: index
                .checked_sub(1)
                .map(|i| Arc::clone(&series.posts[i])),
            next: series.posts.get(index + 1).map(Arc::clone),
            position: index + 1,
            total: series.posts.len(),
        })
    }

    /// The alphabetically sorted set of all tags on non-draft posts.
    pub fn tags(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .posts
            .iter()
            .filter(|p| !p.draft)
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_owned).collect()
    }
}

/// Narrow a listing by an optional search term and an optional tag.
///
/// Both predicates compose: when both are supplied a post must satisfy
/// both. Search is case-insensitive substring, tag is exact membership.
pub fn filter_posts(
    posts: &[Arc<Post>],
    search: Option<&str>,
    tag: Option<&str>,
) -> Vec<Arc<Post>> {
    posts
        .iter()
        .filter(|p| search.is_none_or(|term| p.matches_search(term)))
        .filter(|p| tag.is_none_or(|t| p.has_tag(t)))
        .cloned()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build an index from inline fixture content.
    ///
    /// `posts` are (file name, front matter) pairs; `series` are
    /// (file name, descriptor) pairs.
    fn fixture_index(posts: &[(&str, &str)], series: &[(&str, &str)]) -> ContentIndex {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.content.posts = dir.path().join("posts");
        config.content.series = dir.path().join("series");
        fs::create_dir_all(&config.content.posts).unwrap();
        fs::create_dir_all(&config.content.series).unwrap();

        for (name, front_matter) in posts {
            let content = format!("---\n{front_matter}\n---\nbody of {name}\n");
            fs::write(config.content.posts.join(name), content).unwrap();
        }
        for (name, descriptor) in series {
            fs::write(config.content.series.join(name), descriptor).unwrap();
        }

        ContentIndex::load(&config).unwrap()
    }

    #[test]
    fn test_post_lookup() {
        let index = fixture_index(&[("hello.md", "created: 2024-01-01")], &[]);

        assert!(index.post("hello").is_some());
        assert!(index.post("missing").is_none());
    }

    #[test]
    fn test_latest_posts_sorted_by_created_descending() {
        let index = fixture_index(
            &[
                ("jan.md", "created: 2024-01-01"),
                ("jun.md", "created: 2024-06-01"),
                ("mar.md", "created: 2024-03-01"),
            ],
            &[],
        );

        let latest = index.latest_posts(10, false);
        let slugs: Vec<_> = latest.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["jun", "mar", "jan"]);
    }

    #[test]
    fn test_latest_posts_limit_and_single_winner() {
        let index = fixture_index(
            &[
                ("old.md", "created: 2024-01-01"),
                ("new.md", "created: 2024-06-01"),
            ],
            &[],
        );

        let latest = index.latest_posts(1, false);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].slug, "new");
    }

    #[test]
    fn test_latest_posts_excludes_drafts_by_default() {
        let index = fixture_index(
            &[
                ("visible.md", "created: 2024-01-01"),
                ("hidden.md", "created: 2024-06-01\ndraft: true"),
            ],
            &[],
        );

        let latest = index.latest_posts(10, false);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].slug, "visible");

        let with_drafts = index.latest_posts(10, true);
        assert_eq!(with_drafts.len(), 2);
    }

    #[test]
    fn test_latest_posts_tie_keeps_scan_order() {
        let index = fixture_index(
            &[
                ("a.md", "created: 2024-01-01"),
                ("b.md", "created: 2024-01-01"),
                ("c.md", "created: 2024-01-01"),
            ],
            &[],
        );

        let slugs: Vec<_> = index
            .latest_posts(10, false)
            .iter()
            .map(|p| p.slug.clone())
            .collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_featured_posts_only_featured_no_date_sort() {
        let index = fixture_index(
            &[
                ("feat-old.md", "created: 2024-01-01\nfeatured: true"),
                ("newer-unfeatured.md", "created: 2024-06-01"),
                ("feat-new.md", "created: 2024-03-01\nfeatured: true"),
            ],
            &[],
        );

        let featured = index.featured_posts(10, false);
        let slugs: Vec<_> = featured.iter().map(|p| p.slug.as_str()).collect();
        // scan order, not date order; the newer unfeatured post never appears
        assert_eq!(slugs, vec!["feat-new", "feat-old"]);
    }

    #[test]
    fn test_featured_posts_excludes_drafts() {
        let index = fixture_index(
            &[("draft-feat.md", "created: 2024-01-01\nfeatured: true\ndraft: true")],
            &[],
        );

        assert!(index.featured_posts(10, false).is_empty());
        assert_eq!(index.featured_posts(10, true).len(), 1);
    }

    #[test]
    fn test_series_lookup_filters_drafts_without_mutating() {
        let index = fixture_index(
            &[
                ("one.md", "created: 2024-01-01"),
                ("two.md", "created: 2024-02-01\ndraft: true"),
                ("three.md", "created: 2024-03-01"),
            ],
            &[(
                "guide.yaml",
                "title: Guide\ncreated: 2024-03-01\nposts: [one, two, three]\n",
            )],
        );

        let filtered = index.series("guide", false).unwrap();
        let slugs: Vec<_> = filtered.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["one", "three"]);

        // a second draft-including lookup still sees the full member list
        let full = index.series("guide", true).unwrap();
        assert_eq!(full.posts.len(), 3);

        // and a repeated filtered lookup is unchanged (no creeping narrowing)
        let filtered_again = index.series("guide", false).unwrap();
        assert_eq!(filtered_again.posts.len(), 2);
    }

    #[test]
    fn test_series_containing() {
        let index = fixture_index(
            &[
                ("a.md", "created: 2024-01-01"),
                ("b.md", "created: 2024-02-01"),
            ],
            &[
                ("s1.yaml", "created: 2024-01-01\nposts: [a]\n"),
                ("s2.yaml", "created: 2024-02-01\nposts: [a, b]\n"),
            ],
        );

        let containing_a: Vec<_> = index
            .series_containing("a")
            .iter()
            .map(|s| s.slug.clone())
            .collect();
        assert_eq!(containing_a, vec!["s1", "s2"]);

        let containing_b = index.series_containing("b");
        assert_eq!(containing_b.len(), 1);
        assert!(index.series_containing("nope").is_empty());
    }

    #[test]
    fn test_navigation_first_member() {
        let index = fixture_index(
            &[
                ("a.md", "created: 2024-01-01"),
                ("b.md", "created: 2024-02-01"),
                ("c.md", "created: 2024-03-01"),
            ],
            &[("s.yaml", "created: 2024-01-01\nposts: [a, b, c]\n")],
        );

        let nav = index.navigation("s", "a").unwrap();
        assert!(nav.previous.is_none());
        assert_eq!(nav.next.as_ref().unwrap().slug, "b");
        assert_eq!(nav.position, 1);
        assert_eq!(nav.total, 3);
    }

    #[test]
    fn test_navigation_last_member() {
        let index = fixture_index(
            &[
                ("a.md", "created: 2024-01-01"),
                ("b.md", "created: 2024-02-01"),
                ("c.md", "created: 2024-03-01"),
            ],
            &[("s.yaml", "created: 2024-01-01\nposts: [a, b, c]\n")],
        );

        let nav = index.navigation("s", "c").unwrap();
        assert_eq!(nav.previous.as_ref().unwrap().slug, "b");
        assert!(nav.next.is_none());
        assert_eq!(nav.position, nav.total);
    }

    #[test]
    fn test_navigation_unknown_slugs() {
        let index = fixture_index(
            &[("a.md", "created: 2024-01-01")],
            &[("s.yaml", "created: 2024-01-01\nposts: [a]\n")],
        );

        assert!(index.navigation("missing", "a").is_none());
        assert!(index.navigation("s", "missing").is_none());
    }

    #[test]
    fn test_navigation_skips_drafts() {
        let index = fixture_index(
            &[
                ("a.md", "created: 2024-01-01"),
                ("d.md", "created: 2024-02-01\ndraft: true"),
                ("b.md", "created: 2024-03-01"),
            ],
            &[("s.yaml", "created: 2024-01-01\nposts: [a, d, b]\n")],
        );

        // the draft neither appears as a neighbor nor counts toward total
        let nav = index.navigation("s", "b").unwrap();
        assert_eq!(nav.previous.as_ref().unwrap().slug, "a");
        assert_eq!(nav.position, 2);
        assert_eq!(nav.total, 2);

        // the draft itself is not navigable
        assert!(index.navigation("s", "d").is_none());
    }

    #[test]
    fn test_tags_sorted_and_deduped() {
        let index = fixture_index(
            &[
                ("a.md", "created: 2024-01-01\ntags: [web, rust]"),
                ("b.md", "created: 2024-02-01\ntags: [rust, async]"),
                ("d.md", "created: 2024-03-01\ndraft: true\ntags: [secret]"),
            ],
            &[],
        );

        assert_eq!(index.tags(), vec!["async", "rust", "web"]);
    }

    #[test]
    fn test_filter_posts_search_and_tag_compose() {
        let index = fixture_index(
            &[
                ("a.md", "title: Async Rust\ncreated: 2024-01-01\ntags: [rust]"),
                ("b.md", "title: Async Python\ncreated: 2024-02-01\ntags: [python]"),
                ("c.md", "title: Sync Rust\ncreated: 2024-03-01\ntags: [rust]"),
            ],
            &[],
        );
        let posts = index.latest_posts(100, false);

        let by_search = filter_posts(&posts, Some("async"), None);
        assert_eq!(by_search.len(), 2);

        let by_tag = filter_posts(&posts, None, Some("rust"));
        assert_eq!(by_tag.len(), 2);

        let both = filter_posts(&posts, Some("async"), Some("rust"));
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].slug, "a");

        let none = filter_posts(&posts, None, None);
        assert_eq!(none.len(), 3);
    }

    #[test]
    fn test_filter_posts_tag_is_case_sensitive() {
        let index = fixture_index(
            &[("a.md", "created: 2024-01-01\ntags: [Rust]")],
            &[],
        );
        let posts = index.latest_posts(100, false);

        assert!(filter_posts(&posts, None, Some("rust")).is_empty());
        assert_eq!(filter_posts(&posts, None, Some("Rust")).len(), 1);
        // search, in contrast, is case-insensitive
        assert_eq!(filter_posts(&posts, Some("rust"), None).len(), 1);
    }
}
