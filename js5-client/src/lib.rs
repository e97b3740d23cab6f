//! JS5 content-protocol client.
//!
//! Speaks the RuneTek5 content server protocol over one persistent TCP
//! connection: a version-negotiating handshake followed by any number of
//! pipelined file requests whose interleaved chunked responses are routed
//! back to their callers by a single background demultiplexer. One category
//! can be routed over an HTTP side-channel instead (bulk media in
//! practice), bypassing the socket entirely.

pub mod client;
pub mod config;
pub mod error;
mod key;
pub mod wire;

pub use client::Js5Client;
pub use config::{Js5Config, Language};
pub use error::{Error, Result};
