//! Folio - a markdown blog server.
//!
//! Indexes a directory of markdown posts and YAML series descriptors into
//! an immutable in-memory index, then serves listing, post, series and
//! contact pages over HTTP.

mod cli;
mod config;
mod content;
mod logger;
mod mail;
mod serve;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use content::ContentIndex;
use serve::serve_site;
use std::path::Path;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Serve { .. } => serve_site(config),
        Commands::Check { drafts } => check_site(config, drafts.unwrap_or(false)),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    if !config_path.exists() {
        bail!("Config file not found.");
    }

    let mut config = SiteConfig::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}

/// Load the content directories and print a summary.
///
/// Any load error (bad dates, duplicate slugs, schema violations) is
/// reported through the normal error path, so `folio check` doubles as a
/// pre-publish content lint.
fn check_site(config: &SiteConfig, include_drafts: bool) -> Result<()> {
    let index = ContentIndex::load(config)?;

    let drafts = index.posts().iter().filter(|p| p.draft).count();
    log!(
        "check";
        "{} posts ({} drafts), {} series",
        index.posts().len(),
        drafts,
        index.all_series().len()
    );

    for post in index.latest_posts(usize::MAX, include_drafts) {
        let marker = if post.draft { " [draft]" } else { "" };
        log!("check"; "post: {} ({}){}", post.slug, post.created, marker);
    }

    for series in index.all_series() {
        log!("check"; "series: {} ({} posts)", series.slug, series.posts.len());
    }

    Ok(())
}
