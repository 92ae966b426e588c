use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use reqwest::Client;
use url::Url;

use super::{ContentResolver, Source};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::parser::{ParseError, PlaylistParser};

/// Loads the raw bytes behind a [`Source`].
///
/// Local files and content handles are first copied into `files_dir` and the
/// copy is what gets returned.
pub struct SourceReader {
    client: Client,
    resolver: Arc<dyn ContentResolver>,
    files_dir: PathBuf,
}

impl SourceReader {
    pub fn new(config: &Config, resolver: Arc<dyn ContentResolver>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout.duration())
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(!config.ssl_verification)
            .build()?;

        Ok(Self {
            client,
            resolver,
            files_dir: PathBuf::from(&config.files_dir),
        })
    }

    /// Returns `None` when a network source answers with a non-success status.
    ///
    /// A network body is checked with [`PlaylistParser::sniff`] while it
    /// arrives, so a body that is not a playlist (a live stream, say) fails
    /// with [`ParseError::UnrecognizedFormat`] after its first bytes.
    pub async fn open(
        &self,
        source: &Source,
        parser: &dyn PlaylistParser,
    ) -> Result<Option<Vec<u8>>> {
        match source {
            Source::Network(url) => self.fetch(url, parser).await,
            Source::LocalFile(url) => {
                let path = url
                    .to_file_path()
                    .map_err(|_| AppError::FileNotFound(url.to_string()))?;
                let filename = snapshot_name(path.file_name().and_then(|n| n.to_str()));
                let content = tokio::fs::read(&path)
                    .await
                    .map_err(|e| not_found_or(e, url))?;
                self.snapshot(&filename, &content).await.map(Some)
            }
            Source::Content(url) => {
                let display_name = self.resolver.display_name(url).await;
                let filename = snapshot_name(display_name.as_deref());
                let content = self
                    .resolver
                    .read(url)
                    .await
                    .map_err(|e| not_found_or(e, url))?;
                self.snapshot(&filename, &content).await.map(Some)
            }
        }
    }

    async fn fetch(&self, url: &Url, parser: &dyn PlaylistParser) -> Result<Option<Vec<u8>>> {
        let response = self.client.get(url.as_str()).send().await?;

        if !response.status().is_success() {
            tracing::warn!("Failed to fetch playlist {}: HTTP {}", url, response.status());
            return Ok(None);
        }

        let mut body = response.bytes_stream();
        let mut bytes = Vec::new();
        let mut recognized = false;
        while let Some(chunk) = body.next().await {
            bytes.extend_from_slice(&chunk?);
            if !recognized {
                match parser.sniff(&bytes) {
                    Some(true) => recognized = true,
                    Some(false) => {
                        tracing::debug!(
                            "{} is not a playlist, stopped after {} bytes",
                            url,
                            bytes.len()
                        );
                        return Err(ParseError::UnrecognizedFormat.into());
                    }
                    None => {}
                }
            }
        }

        tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(Some(bytes))
    }

    /// Write `content` to `files_dir/filename`, creating or overwriting it,
    /// then read the stored copy back.
    async fn snapshot(&self, filename: &str, content: &[u8]) -> Result<Vec<u8>> {
        tokio::fs::create_dir_all(&self.files_dir).await?;
        let path = self.files_dir.join(filename);
        tokio::fs::write(&path, content).await?;
        tracing::debug!("Stored playlist snapshot at {:?}", path);
        Ok(tokio::fs::read(&path).await?)
    }
}

/// Final path component of `display_name`, or `File_<epoch-millis>.txt`.
fn snapshot_name(display_name: Option<&str>) -> String {
    display_name
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("File_{}.txt", Utc::now().timestamp_millis()))
}

fn not_found_or(e: io::Error, url: &Url) -> AppError {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            AppError::FileNotFound(url.to_string())
        }
        _ => AppError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConnectTimeout, RetentionStrategy};
    use crate::parser::M3uParser;
    use crate::source::test_server::{serve_endless, serve_once};
    use crate::source::UnsupportedContentResolver;
    use async_trait::async_trait;

    struct FakeResolver {
        name: Option<String>,
        content: Option<Vec<u8>>,
    }

    #[async_trait]
    impl ContentResolver for FakeResolver {
        async fn display_name(&self, _uri: &Url) -> Option<String> {
            self.name.clone()
        }

        async fn read(&self, _uri: &Url) -> io::Result<Vec<u8>> {
            self.content
                .clone()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn config(files_dir: &Path) -> Config {
        Config {
            db_path: ":memory:".to_string(),
            files_dir: files_dir.to_string_lossy().to_string(),
            retention_strategy: RetentionStrategy::All,
            connect_timeout: ConnectTimeout::Short,
            ssl_verification: true,
            user_agent: "test".to_string(),
        }
    }

    fn reader(files_dir: &Path, resolver: FakeResolver) -> SourceReader {
        SourceReader::new(&config(files_dir), Arc::new(resolver)).unwrap()
    }

    fn no_content() -> FakeResolver {
        FakeResolver {
            name: None,
            content: None,
        }
    }

    #[test]
    fn snapshot_name_uses_last_component_or_timestamp() {
        assert_eq!(snapshot_name(Some("list.m3u")), "list.m3u");
        assert_eq!(snapshot_name(Some("../../etc/list.m3u")), "list.m3u");
        let synthetic = snapshot_name(None);
        assert!(synthetic.starts_with("File_") && synthetic.ends_with(".txt"));
        assert!(snapshot_name(Some("")).starts_with("File_"));
    }

    #[tokio::test]
    async fn local_file_is_copied_into_files_dir() {
        let source_dir = tempfile::tempdir().unwrap();
        let files_dir = tempfile::tempdir().unwrap();
        let path = source_dir.path().join("local.m3u");
        std::fs::write(&path, "#EXTM3U\nhttp://a\n").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let bytes = reader(files_dir.path(), no_content())
            .open(&Source::LocalFile(url), &M3uParser::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(bytes, b"#EXTM3U\nhttp://a\n");
        let copy = std::fs::read(files_dir.path().join("local.m3u")).unwrap();
        assert_eq!(copy, bytes);
    }

    #[tokio::test]
    async fn snapshot_overwrites_existing_copy() {
        let source_dir = tempfile::tempdir().unwrap();
        let files_dir = tempfile::tempdir().unwrap();
        std::fs::write(files_dir.path().join("local.m3u"), "stale stale stale").unwrap();
        let path = source_dir.path().join("local.m3u");
        std::fs::write(&path, "#EXTM3U\n").unwrap();

        let bytes = reader(files_dir.path(), no_content())
            .open(
                &Source::LocalFile(Url::from_file_path(&path).unwrap()),
                &M3uParser::new(),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(bytes, b"#EXTM3U\n");
    }

    #[tokio::test]
    async fn missing_local_file_is_not_found() {
        let files_dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(files_dir.path().join("missing.m3u")).unwrap();

        let err = reader(files_dir.path(), no_content())
            .open(&Source::LocalFile(url), &M3uParser::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn content_handle_uses_display_name() {
        let files_dir = tempfile::tempdir().unwrap();
        let resolver = FakeResolver {
            name: Some("shared.m3u".to_string()),
            content: Some(b"#EXTM3U\nhttp://b\n".to_vec()),
        };
        let url = Url::parse("content://provider/document/7").unwrap();

        let bytes = reader(files_dir.path(), resolver)
            .open(&Source::Content(url), &M3uParser::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(bytes, b"#EXTM3U\nhttp://b\n");
        assert!(files_dir.path().join("shared.m3u").exists());
    }

    #[tokio::test]
    async fn content_handle_without_name_gets_synthetic_file() {
        let files_dir = tempfile::tempdir().unwrap();
        let resolver = FakeResolver {
            name: None,
            content: Some(b"#EXTM3U\n".to_vec()),
        };
        let url = Url::parse("content://provider/document/8").unwrap();

        reader(files_dir.path(), resolver)
            .open(&Source::Content(url), &M3uParser::new())
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(files_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("File_"));
    }

    #[tokio::test]
    async fn unreadable_content_handle_is_not_found() {
        let files_dir = tempfile::tempdir().unwrap();
        let url = Url::parse("content://provider/document/9").unwrap();
        let reader = SourceReader::new(
            &config(files_dir.path()),
            Arc::new(UnsupportedContentResolver),
        )
        .unwrap();

        let err = reader
            .open(&Source::Content(url), &M3uParser::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn network_body_is_returned() {
        let files_dir = tempfile::tempdir().unwrap();
        let url = serve_once("200 OK", "#EXTM3U\nhttp://c\n").await;

        let bytes = reader(files_dir.path(), no_content())
            .open(&Source::Network(url), &M3uParser::new())
            .await
            .unwrap();

        assert_eq!(bytes.as_deref(), Some(&b"#EXTM3U\nhttp://c\n"[..]));
    }

    #[tokio::test]
    async fn network_error_status_yields_nothing() {
        let files_dir = tempfile::tempdir().unwrap();
        let url = serve_once("404 Not Found", "missing").await;

        let bytes = reader(files_dir.path(), no_content())
            .open(&Source::Network(url), &M3uParser::new())
            .await
            .unwrap();

        assert!(bytes.is_none());
    }

    #[tokio::test]
    async fn endless_non_playlist_body_is_rejected_early() {
        let files_dir = tempfile::tempdir().unwrap();
        let url = serve_endless(b"not a playlist header\n").await;

        let source_reader = reader(files_dir.path(), no_content());

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            source_reader.open(&Source::Network(url), &M3uParser::new()),
        )
        .await
        .expect("reader stopped on the first chunk");

        assert!(result.unwrap_err().is_unrecognized_format());
    }
}
