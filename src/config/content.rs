//! `[content]` section configuration.
//!
//! Locates the directories the index is built from.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[content]` section in folio.toml - content directory layout.
///
/// Posts are markdown files with a YAML front-matter block; series are
/// standalone YAML descriptors. Both paths are resolved against the site
/// root at startup.
///
/// # Example
/// ```toml
/// [content]
/// posts = "content/posts"
/// series = "content/series"
/// assets = "static"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Site root directory (set from CLI, not usually from the file).
    #[serde(default = "defaults::content::root")]
    #[educe(Default = defaults::content::root())]
    pub root: Option<PathBuf>,

    /// Directory of post documents (`.md` with front-matter).
    #[serde(default = "defaults::content::posts")]
    #[educe(Default = defaults::content::posts())]
    pub posts: PathBuf,

    /// Directory of series descriptors (`.yaml`).
    #[serde(default = "defaults::content::series")]
    #[educe(Default = defaults::content::series())]
    pub series: PathBuf,

    /// Static asset directory, served under `/static/`.
    #[serde(default = "defaults::content::assets")]
    #[educe(Default = defaults::content::assets())]
    pub assets: PathBuf,
}
