//! Client configuration.

use std::time::Duration;

/// Language byte sent in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Language {
    #[default]
    English = 0,
    German = 1,
    French = 2,
    Portuguese = 3,
}

/// Configuration for a [`Js5Client`](crate::Js5Client).
#[derive(Debug, Clone)]
pub struct Js5Config {
    /// Content server hostname
    pub content_host: String,
    /// Content server TCP port
    pub content_port: u16,
    /// Page scraped for the embedded handshake key
    pub key_page: String,
    /// Language byte for the handshake
    pub language: Language,
    /// Initial major protocol version; incremented while the server
    /// reports it outdated
    pub major_version: u32,
    /// Minor protocol version; observed to always be 1
    pub minor_version: u32,
    /// Upper bound on bytes consumed per demultiplexer round
    pub block_length: usize,
    /// Categories routed over the HTTP side-channel instead of the socket
    pub http_categories: Vec<u8>,
    /// Base URL for the HTTP side-channel; derived from `content_host`
    /// when unset
    pub http_interface: Option<String>,
    /// Bound on the version-increment handshake retry loop
    pub max_handshake_attempts: u32,
    /// Per-request timeout; `None` waits indefinitely, which is the
    /// original protocol contract
    pub request_timeout: Option<Duration>,
}

impl Default for Js5Config {
    fn default() -> Self {
        Self {
            content_host: "content.runescape.com".to_string(),
            content_port: 43594,
            key_page: "http://world2.runescape.com".to_string(),
            language: Language::English,
            major_version: 873,
            minor_version: 1,
            block_length: 102_400,
            // Category 40 is the music index, served over HTTP in practice.
            http_categories: vec![40],
            http_interface: None,
            max_handshake_attempts: 32,
            request_timeout: None,
        }
    }
}

impl Js5Config {
    /// Set the content server host
    #[must_use]
    pub fn with_content_host(mut self, host: impl Into<String>) -> Self {
        self.content_host = host.into();
        self
    }

    /// Set the content server port
    #[must_use]
    pub fn with_content_port(mut self, port: u16) -> Self {
        self.content_port = port;
        self
    }

    /// Set the handshake key page
    #[must_use]
    pub fn with_key_page(mut self, key_page: impl Into<String>) -> Self {
        self.key_page = key_page.into();
        self
    }

    /// Set the handshake language
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the initial major version
    #[must_use]
    pub fn with_major_version(mut self, major_version: u32) -> Self {
        self.major_version = major_version;
        self
    }

    /// Set the per-round block length
    #[must_use]
    pub fn with_block_length(mut self, block_length: usize) -> Self {
        self.block_length = block_length;
        self
    }

    /// Set the categories served over HTTP
    #[must_use]
    pub fn with_http_categories(mut self, categories: Vec<u8>) -> Self {
        self.http_categories = categories;
        self
    }

    /// Set the base URL for the HTTP side-channel
    #[must_use]
    pub fn with_http_interface(mut self, base: impl Into<String>) -> Self {
        self.http_interface = Some(base.into());
        self
    }

    /// Set the handshake retry bound
    #[must_use]
    pub fn with_max_handshake_attempts(mut self, attempts: u32) -> Self {
        self.max_handshake_attempts = attempts;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
