use std::io::BufRead;

use thiserror::Error;

use crate::models::Entry;

mod m3u;

pub use m3u::M3uParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Document is not a recognised playlist format")]
    UnrecognizedFormat,

    #[error("Failed to read playlist: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a playlist document into channel entries, in document order.
pub trait PlaylistParser: Send + Sync {
    fn parse(&self, input: &mut dyn BufRead) -> Result<Vec<Entry>, ParseError>;

    /// Look at the start of a document that is still arriving.
    ///
    /// `Some(false)` means the document can be rejected without reading the
    /// rest, `None` that more bytes are needed to decide.
    fn sniff(&self, _head: &[u8]) -> Option<bool> {
        Some(true)
    }
}
