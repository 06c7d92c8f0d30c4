//! Content loading error types.
//!
//! The loader is tolerant where a data-shape problem only affects one
//! relationship (unknown series members are dropped, files without
//! front-matter are skipped) and fatal where a problem would break a
//! downstream invariant (dates drive all recency ordering, slugs are the
//! primary lookup key).

use std::path::PathBuf;
use thiserror::Error;

/// Content loading errors. Any of these aborts the whole collection load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid front-matter in `{0}`")]
    FrontMatter(PathBuf, #[source] serde_yaml::Error),

    #[error("Invalid series descriptor `{0}`")]
    Descriptor(PathBuf, #[source] serde_yaml::Error),

    #[error("Missing `{field}` date in `{file}`")]
    MissingDate { file: PathBuf, field: &'static str },

    #[error("Invalid `{field}` date `{value}` in `{file}` (expected YYYY-MM-DD)")]
    InvalidDate {
        file: PathBuf,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Duplicate slug `{slug}` in `{second}` (already used by `{first}`)")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}
