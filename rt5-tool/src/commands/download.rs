//! Downloading over the content protocol.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use js5_client::{Js5Client, Js5Config};
use rt5_cache::Cache;

/// Arguments for the `download` subcommand.
#[derive(Args)]
pub struct DownloadArgs {
    /// Content server hostname
    #[arg(long, default_value = "content.runescape.com")]
    pub host: String,

    /// Content server port
    #[arg(long, default_value_t = 43594)]
    pub port: u16,

    /// Page the handshake key is scraped from
    #[arg(long, default_value = "http://world2.runescape.com")]
    pub key_page: String,

    /// Initial major protocol version to offer
    #[arg(long, default_value_t = 873)]
    pub version: u32,

    /// Directory to download into
    #[arg(long, default_value = "cache")]
    pub output: PathBuf,

    /// Download one category instead of all of them
    #[arg(long)]
    pub category: Option<u8>,

    /// Download one file; requires --category
    #[arg(long, requires = "category")]
    pub file: Option<u32>,

    /// Overwrite files already downloaded
    #[arg(long)]
    pub overwrite: bool,
}

pub async fn run(args: DownloadArgs) -> anyhow::Result<()> {
    let config = Js5Config::default()
        .with_content_host(args.host.clone())
        .with_content_port(args.port)
        .with_key_page(args.key_page)
        .with_major_version(args.version);

    let client = Js5Client::connect(config)
        .await
        .with_context(|| format!("connecting to {}:{}", args.host, args.port))?;
    println!("connected, protocol version {}", client.major_version());

    let cache = Cache::new(client).with_output_dir(&args.output);
    let categories = match args.category {
        Some(category) => vec![category],
        None => cache.categories().await.context("reading the master reference table")?,
    };
    let single = args.category.zip(args.file);

    super::extract_selection(&cache, categories, single, args.overwrite).await
}
