//! Error types for the content-protocol client

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Content-protocol error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The handshake key could not be scraped from the key page
    #[error("Key retrieval failed: {0}")]
    KeyRetrieval(String),

    /// The server answered the handshake with an unknown response code
    #[error("Content server responded to handshake with {code}")]
    Handshake { code: u8 },

    /// The version-increment retry loop hit its configured bound
    #[error("Handshake still outdated after {attempts} attempts (last version {last_version})")]
    HandshakeAttemptsExhausted { attempts: u32, last_version: u32 },

    /// The HTTP side-channel answered with a non-success status
    #[error("HTTP interface responded with status code {status}")]
    HttpStatus { status: u16 },

    /// A request for this key is already in flight
    #[error("A request for {category}/{file_id} is already pending")]
    RequestAlreadyPending { category: u8, file_id: u32 },

    /// The configured request timeout elapsed before the response completed
    #[error("Request for {category}/{file_id} timed out")]
    RequestTimeout { category: u8, file_id: u32 },

    /// A response tag matched no pending request; the stream can no longer
    /// be trusted and the connection must be rebuilt
    #[error("Response for {category}/{file_id} matches no pending request")]
    ProtocolDesync { category: u8, file_id: u32 },

    /// The connection failed or was torn down with requests outstanding
    #[error("Connection closed")]
    ConnectionClosed,

    /// The reference table holds no entry for the requested file
    #[error("File {file_id} not found in category {category}")]
    FileNotFound { category: u8, file_id: u32 },

    /// Container decoding failed while assembling a reference table
    #[error("Container error: {0}")]
    Container(#[from] rt5_container::Error),

    /// Reference table decoding failed
    #[error("Reference table error: {0}")]
    Reference(#[from] rt5_reference::Error),
}

impl From<Error> for rt5_cache::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::FileNotFound { category, file_id } => {
                Self::FileNotFound { category, file_id }
            }
            Error::Container(e) => Self::Container(e),
            Error::Reference(e) => Self::Reference(e),
            Error::Io(e) => Self::Io(e),
            other => Self::Session(other.to_string()),
        }
    }
}
