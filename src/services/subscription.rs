use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;

use crate::db::PlaylistStore;
use crate::error::{AppError, Result};
use crate::models::{Channel, Playlist, ProgressResource, RetentionStrategy, IMPORTED_PLAYLIST_URL};
use crate::parser::PlaylistParser;
use crate::source::{Source, SourceReader};
use crate::sync::{reconcile, ProgressEmitter, ProgressStream};

const FILE_NOT_FOUND: &str = "File not found";

/// Subscribe, refresh and remove playlists.
///
/// Subscribes of different playlists may run side by side. Two subscribes of
/// the same playlist url race on its channels and must be serialised by the
/// caller, as [`SubscriptionService::refresh_all`] does.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn PlaylistStore>,
    reader: Arc<SourceReader>,
    parser: Arc<dyn PlaylistParser>,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn PlaylistStore>,
        reader: Arc<SourceReader>,
        parser: Arc<dyn PlaylistParser>,
    ) -> Self {
        Self {
            store,
            reader,
            parser,
        }
    }

    /// Fetch `url`, store it as a playlist titled `title` and bring its
    /// channels in line with the document under `strategy`.
    pub fn subscribe(
        &self,
        title: &str,
        url: &str,
        strategy: RetentionStrategy,
    ) -> ProgressStream<()> {
        let this = self.clone();
        let title = title.to_string();
        let url = url.trim().to_string();
        ProgressStream::spawn(move |emitter| async move {
            this.run_subscribe(title, url, strategy, emitter).await
        })
    }

    async fn run_subscribe(
        &self,
        title: String,
        url: String,
        strategy: RetentionStrategy,
        mut emitter: ProgressEmitter<()>,
    ) {
        let source = match Source::classify(&url) {
            Ok(source) => source,
            Err(message) => {
                tracing::info!("Not subscribing to '{}': {}", url, message);
                emitter.message(message).await;
                return;
            }
        };

        let result = match self
            .refresh_playlist(&title, &url, &source, strategy, &mut emitter)
            .await
        {
            Err(e) if e.is_unrecognized_format() => {
                tracing::info!("{} is not a playlist, importing it as a channel", url);
                self.import_single(&title, &url, &mut emitter).await
            }
            other => other,
        };

        match result {
            Ok(()) => emitter.success(()).await,
            Err(AppError::FileNotFound(path)) => {
                tracing::warn!("Playlist source not found: {}", path);
                emitter.message(FILE_NOT_FOUND).await;
            }
            Err(e) => {
                tracing::error!("Failed to subscribe to {}: {:?}", url, e);
                emitter.failure(e.to_string()).await;
            }
        }
    }

    async fn refresh_playlist(
        &self,
        title: &str,
        url: &str,
        source: &Source,
        strategy: RetentionStrategy,
        emitter: &mut ProgressEmitter<()>,
    ) -> Result<()> {
        let entries = match self.reader.open(source, self.parser.as_ref()).await? {
            Some(bytes) => self.parser.parse(&mut bytes.as_slice())?,
            None => Vec::new(),
        };

        self.store.upsert_playlist(&Playlist::new(title, url)).await?;
        let existing = self.store.get_channels_by_playlist(url).await?;
        let plan = reconcile(url, strategy, &existing, entries);

        for channel_url in &plan.to_delete {
            self.store.delete_channel(channel_url).await?;
        }
        for channel in &plan.to_insert {
            self.store.insert_channel(channel).await?;
            if !emitter.advance().await {
                tracing::debug!("Subscribe to {} cancelled", url);
                return Ok(());
            }
        }

        tracing::info!(
            "Subscribed to {}: {} removed, {} written, {} kept",
            url,
            plan.to_delete.len(),
            plan.to_insert.len(),
            plan.skipped.len()
        );
        Ok(())
    }

    /// Store the whole reference as one channel of the imported playlist.
    async fn import_single(
        &self,
        title: &str,
        url: &str,
        emitter: &mut ProgressEmitter<()>,
    ) -> Result<()> {
        if self.store.get_playlist(IMPORTED_PLAYLIST_URL).await?.is_none() {
            self.store.upsert_playlist(&Playlist::imported()).await?;
        }

        let channel = Channel {
            url: url.to_string(),
            title: title.to_string(),
            group: String::new(),
            playlist_url: IMPORTED_PLAYLIST_URL.to_string(),
            favourite: false,
            cover: None,
        };
        self.store.insert_channel(&channel).await?;
        emitter.advance().await;
        Ok(())
    }

    /// Delete a playlist and its channels. Returns the removed playlist.
    pub async fn unsubscribe(&self, url: &str) -> Result<Option<Playlist>> {
        let playlist = self.store.get_playlist(url).await?;
        self.store.delete_channels_by_playlist(url).await?;
        if playlist.is_some() {
            self.store.delete_playlist(url).await?;
            tracing::info!("Unsubscribed from {}", url);
        }
        Ok(playlist)
    }

    /// Best effort: failures are logged, not returned.
    pub async fn rename(&self, url: &str, target: &str) {
        if let Err(e) = self.store.rename_playlist(url, target).await {
            tracing::warn!("Failed to rename playlist {}: {}", url, e);
        }
    }

    pub async fn get(&self, url: &str) -> Result<Option<Playlist>> {
        self.store.get_playlist(url).await
    }

    pub async fn get_all(&self) -> Result<Vec<Playlist>> {
        self.store.get_all_playlists().await
    }

    pub fn observe_all(&self) -> watch::Receiver<Vec<Playlist>> {
        self.store.observe_playlists()
    }

    pub async fn channels(&self, playlist_url: &str) -> Result<Vec<Channel>> {
        self.store.get_channels_by_playlist(playlist_url).await
    }

    /// Flip the favourite flag. Returns the new value, or `None` for an
    /// unknown channel.
    pub async fn toggle_favourite(&self, channel_url: &str) -> Result<Option<bool>> {
        let Some(channel) = self.store.get_channel(channel_url).await? else {
            return Ok(None);
        };
        let favourite = !channel.favourite;
        self.store.set_channel_favourite(channel_url, favourite).await?;
        Ok(Some(favourite))
    }

    /// Subscribe again to every stored playlist, one at a time, and report
    /// the terminal state of each.
    pub async fn refresh_all(
        &self,
        strategy: RetentionStrategy,
    ) -> Result<Vec<(Playlist, ProgressResource<()>)>> {
        let playlists = self.get_all().await?;
        let mut outcomes = Vec::with_capacity(playlists.len());

        for playlist in playlists.into_iter().filter(|p| !p.is_imported()) {
            let mut stream = self.subscribe(&playlist.title, &playlist.url, strategy);
            let mut last = ProgressResource::Failure("No result".to_string());
            while let Some(state) = stream.next().await {
                let terminal = state.is_terminal();
                last = state;
                if terminal {
                    break;
                }
            }
            tracing::debug!("Refreshed {}: {:?}", playlist.url, last);
            outcomes.push((playlist, last));
        }

        Ok(outcomes)
    }
}
