//! Extraction from a local chunked cache.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rt5_cache::Cache;
use rt5_store::{DiskCacheStore, StoreConfig};
use tracing::debug;

/// Arguments for the `extract` subcommand.
#[derive(Args)]
pub struct ExtractArgs {
    /// Cache directory; defaults to the Jagex cache under the home
    /// directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Directory to extract into
    #[arg(long, default_value = "cache")]
    pub output: PathBuf,

    /// Extract one category instead of all of them
    #[arg(long)]
    pub category: Option<u8>,

    /// Extract one file; requires --category
    #[arg(long, requires = "category")]
    pub file: Option<u32>,

    /// Overwrite files already extracted
    #[arg(long)]
    pub overwrite: bool,

    /// Read the data file with seeks instead of memory mapping
    #[arg(long)]
    pub no_mmap: bool,
}

fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("jagexcache").join("runescape").join("LIVE"))
}

pub async fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let cache_dir = args
        .cache_dir
        .or_else(default_cache_dir)
        .context("no --cache-dir given and the home directory could not be determined")?;
    debug!(cache_dir = %cache_dir.display(), "opening local cache");

    let config = StoreConfig::new(&cache_dir).with_memory_mapping(!args.no_mmap);
    let store = DiskCacheStore::open(config)
        .with_context(|| format!("opening cache at {}", cache_dir.display()))?;

    let categories = match args.category {
        Some(category) => vec![category],
        None => store.categories(),
    };
    let single = args.category.zip(args.file);

    let cache = Cache::new(store).with_output_dir(&args.output);
    super::extract_selection(&cache, categories, single, args.overwrite).await
}
