//! Subcommand implementations.

pub mod download;
pub mod extract;
pub mod sounds;

use rt5_cache::{Cache, CacheSource, CategoryExtraction};

/// Runs the shared extraction loop and prints the outcome.
///
/// `single` extracts one file; otherwise every file in `categories` is
/// extracted, with per-file failures reported but not fatal.
pub async fn extract_selection<S: CacheSource>(
    cache: &Cache<S>,
    categories: Vec<u8>,
    single: Option<(u8, u32)>,
    overwrite: bool,
) -> anyhow::Result<()> {
    if let Some((category, file_id)) = single {
        let written = cache.extract(category, file_id, overwrite).await?;
        for path in &written {
            println!("{}", path.display());
        }
        if written.is_empty() {
            println!("{category}/{file_id}: already present, skipped");
        }
        return Ok(());
    }

    let mut written = 0usize;
    let mut failed = 0usize;
    for category in categories {
        let CategoryExtraction {
            written: paths,
            failures,
        } = cache.extract_category(category, overwrite).await?;
        written += paths.len();
        failed += failures.len();
        for (file_id, error) in &failures {
            eprintln!("{category}/{file_id}: {error}");
        }
    }
    println!("{written} files written, {failed} failed");
    Ok(())
}
