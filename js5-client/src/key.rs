//! Handshake key retrieval.
//!
//! The content server rejects handshakes whose key does not match the
//! one currently embedded in the game applet page, so the key is
//! scraped from that page rather than configured statically.

use regex::Regex;
use tracing::debug;

use crate::{Error, Result};

const KEY_PATTERN: &str = r#"<param\s+name="1"\s+value="([^"]+)""#;

/// Fetches the current handshake key from the given applet page.
pub async fn fetch_key(http: &reqwest::Client, key_page: &str) -> Result<String> {
    debug!(key_page, "fetching handshake key");

    let response = http.get(key_page).send().await?;
    if !response.status().is_success() {
        return Err(Error::KeyRetrieval(format!(
            "key page returned status {}",
            response.status()
        )));
    }

    let body = response.text().await?;
    let pattern = Regex::new(KEY_PATTERN)
        .map_err(|e| Error::KeyRetrieval(format!("invalid key pattern: {e}")))?;
    let key = pattern
        .captures(&body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            Error::KeyRetrieval("no applet key parameter found in key page".to_string())
        })?;

    debug!(key, "obtained handshake key");
    Ok(key)
}
