mod repository;
mod schema;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{Channel, Playlist};

pub use repository::Repository;

/// Storage for playlists and their channels.
///
/// Each call is atomic on its own; callers sequence them.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Insert the playlist, or update the title of an existing one without
    /// touching its channels.
    async fn upsert_playlist(&self, playlist: &Playlist) -> Result<()>;

    async fn get_playlist(&self, url: &str) -> Result<Option<Playlist>>;

    /// Delete the playlist and, by cascade, its channels.
    async fn delete_playlist(&self, url: &str) -> Result<()>;

    async fn get_all_playlists(&self) -> Result<Vec<Playlist>>;

    /// Receiver that sees the full playlist list after every playlist change.
    fn observe_playlists(&self) -> watch::Receiver<Vec<Playlist>>;

    async fn rename_playlist(&self, url: &str, title: &str) -> Result<()>;

    async fn get_channels_by_playlist(&self, playlist_url: &str) -> Result<Vec<Channel>>;

    async fn get_channel(&self, url: &str) -> Result<Option<Channel>>;

    /// Insert a channel, or update the stored row with the same url. The
    /// stored favourite flag is kept.
    async fn insert_channel(&self, channel: &Channel) -> Result<()>;

    async fn delete_channel(&self, url: &str) -> Result<()>;

    async fn delete_channels_by_playlist(&self, playlist_url: &str) -> Result<()>;

    async fn set_channel_favourite(&self, url: &str, favourite: bool) -> Result<()>;
}
