use serde::{Deserialize, Serialize};

/// Reserved playlist URL owning channels imported from documents that are
/// not recognised as playlists.
pub const IMPORTED_PLAYLIST_URL: &str = "imported";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub url: String,
    pub title: String,
}

impl Playlist {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    pub fn imported() -> Self {
        Self::new("", IMPORTED_PLAYLIST_URL)
    }

    pub fn is_imported(&self) -> bool {
        self.url == IMPORTED_PLAYLIST_URL
    }
}
