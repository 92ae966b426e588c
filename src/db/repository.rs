use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tokio::sync::watch;
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Channel, Playlist};

use super::schema::SCHEMA;
use super::PlaylistStore;

const CHANNEL_COLUMNS: &str = "url, title, group_title, playlist_url, favourite, cover";

pub struct Repository {
    conn: Connection,
    playlists_tx: watch::Sender<Vec<Playlist>>,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let conn = Connection::open(db_path).await?;
        Self::with_connection(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        let (playlists_tx, _) = watch::channel(Vec::new());
        let repository = Self { conn, playlists_tx };
        repository.publish_playlists().await?;
        Ok(repository)
    }

    async fn publish_playlists(&self) -> Result<()> {
        let playlists = self.get_all_playlists().await?;
        self.playlists_tx.send_replace(playlists);
        Ok(())
    }
}

#[async_trait]
impl PlaylistStore for Repository {
    // Playlist operations

    async fn upsert_playlist(&self, playlist: &Playlist) -> Result<()> {
        let playlist = playlist.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO playlists (url, title) VALUES (?1, ?2)
                       ON CONFLICT(url) DO UPDATE SET
                           title = excluded.title,
                           updated_at = datetime('now')"#,
                    params![playlist.url, playlist.title],
                )?;
                Ok(())
            })
            .await?;
        self.publish_playlists().await
    }

    async fn get_playlist(&self, url: &str) -> Result<Option<Playlist>> {
        let url = url.to_string();
        let playlist = self
            .conn
            .call(move |conn| {
                let playlist = conn
                    .query_row(
                        "SELECT url, title FROM playlists WHERE url = ?1",
                        params![url],
                        playlist_from_row,
                    )
                    .optional()?;
                Ok(playlist)
            })
            .await?;
        Ok(playlist)
    }

    async fn delete_playlist(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM playlists WHERE url = ?1", params![url])?;
                Ok(())
            })
            .await?;
        self.publish_playlists().await
    }

    async fn get_all_playlists(&self) -> Result<Vec<Playlist>> {
        let playlists = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT url, title FROM playlists ORDER BY created_at, rowid")?;
                let playlists = stmt
                    .query_map([], playlist_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(playlists)
            })
            .await?;
        Ok(playlists)
    }

    fn observe_playlists(&self) -> watch::Receiver<Vec<Playlist>> {
        self.playlists_tx.subscribe()
    }

    async fn rename_playlist(&self, url: &str, title: &str) -> Result<()> {
        let url = url.to_string();
        let title = title.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE playlists SET title = ?1, updated_at = datetime('now') WHERE url = ?2",
                    params![title, url],
                )?;
                Ok(())
            })
            .await?;
        self.publish_playlists().await
    }

    // Channel operations

    async fn get_channels_by_playlist(&self, playlist_url: &str) -> Result<Vec<Channel>> {
        let playlist_url = playlist_url.to_string();
        let channels = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM channels WHERE playlist_url = ?1 ORDER BY rowid",
                    CHANNEL_COLUMNS
                ))?;
                let channels = stmt
                    .query_map(params![playlist_url], channel_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(channels)
            })
            .await?;
        Ok(channels)
    }

    async fn get_channel(&self, url: &str) -> Result<Option<Channel>> {
        let url = url.to_string();
        let channel = self
            .conn
            .call(move |conn| {
                let channel = conn
                    .query_row(
                        &format!("SELECT {} FROM channels WHERE url = ?1", CHANNEL_COLUMNS),
                        params![url],
                        channel_from_row,
                    )
                    .optional()?;
                Ok(channel)
            })
            .await?;
        Ok(channel)
    }

    async fn insert_channel(&self, channel: &Channel) -> Result<()> {
        let channel = channel.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO channels (url, title, group_title, playlist_url, favourite, cover)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                       ON CONFLICT(url) DO UPDATE SET
                           title = excluded.title,
                           group_title = excluded.group_title,
                           playlist_url = excluded.playlist_url,
                           cover = excluded.cover"#,
                    params![
                        channel.url,
                        channel.title,
                        channel.group,
                        channel.playlist_url,
                        channel.favourite,
                        channel.cover,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn delete_channel(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM channels WHERE url = ?1", params![url])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn delete_channels_by_playlist(&self, playlist_url: &str) -> Result<()> {
        let playlist_url = playlist_url.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM channels WHERE playlist_url = ?1",
                    params![playlist_url],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn set_channel_favourite(&self, url: &str, favourite: bool) -> Result<()> {
        let url = url.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE channels SET favourite = ?1 WHERE url = ?2",
                    params![favourite, url],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        url: row.get(0)?,
        title: row.get(1)?,
    })
}

fn channel_from_row(row: &Row) -> rusqlite::Result<Channel> {
    Ok(Channel {
        url: row.get(0)?,
        title: row.get(1)?,
        group: row.get(2)?,
        playlist_url: row.get(3)?,
        favourite: row.get::<_, i64>(4)? != 0,
        cover: row.get(5)?,
    })
}
