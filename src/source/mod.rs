use std::io;

use async_trait::async_trait;
use url::Url;

mod reader;
#[cfg(test)]
pub(crate) mod test_server;

pub use reader::SourceReader;

/// Access to platform content handles (`content://...`).
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Human readable name of the document, if the provider exposes one.
    async fn display_name(&self, uri: &Url) -> Option<String>;

    async fn read(&self, uri: &Url) -> io::Result<Vec<u8>>;
}

/// Resolver for hosts without a content provider. Every handle is missing.
pub struct UnsupportedContentResolver;

#[async_trait]
impl ContentResolver for UnsupportedContentResolver {
    async fn display_name(&self, _uri: &Url) -> Option<String> {
        None
    }

    async fn read(&self, uri: &Url) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no content provider for {}", uri),
        ))
    }
}

/// A playlist reference, classified by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Network(Url),
    LocalFile(Url),
    Content(Url),
}

impl Source {
    /// Classify a reference. `Err` carries a short message for references
    /// that cannot be subscribed to.
    pub fn classify(reference: &str) -> std::result::Result<Source, String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err("URL is empty".to_string());
        }

        let url = match Url::parse(reference) {
            Ok(url) => url,
            Err(_) => return Err("URL is invalid".to_string()),
        };

        match url.scheme() {
            "http" | "https" => Ok(Source::Network(url)),
            "file" => Ok(Source::LocalFile(url)),
            "content" => Ok(Source::Content(url)),
            other => Err(format!("Unsupported URL scheme: {}", other)),
        }
    }
}
