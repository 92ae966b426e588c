use serde::{Deserialize, Serialize};

/// A stored channel. The URL is unique across every playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub url: String,
    pub title: String,
    pub group: String,
    pub playlist_url: String,
    pub favourite: bool,
    pub cover: Option<String>,
}

/// A channel as read from a playlist document, before it belongs to a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub title: String,
    pub url: String,
    pub group: String,
    pub cover: Option<String>,
}

impl Entry {
    pub fn into_channel(self, playlist_url: &str) -> Channel {
        Channel {
            url: self.url,
            title: self.title,
            group: self.group,
            playlist_url: playlist_url.to_string(),
            favourite: false,
            cover: self.cover,
        }
    }
}
