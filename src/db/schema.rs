pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- playlists table
CREATE TABLE IF NOT EXISTS playlists (
    url TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- channels table, channel urls are unique across playlists
CREATE TABLE IF NOT EXISTS channels (
    url TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    group_title TEXT NOT NULL DEFAULT '',
    playlist_url TEXT NOT NULL REFERENCES playlists(url) ON DELETE CASCADE,
    favourite INTEGER NOT NULL DEFAULT 0,
    cover TEXT
);

CREATE INDEX IF NOT EXISTS idx_channels_playlist_url ON channels(playlist_url);
CREATE INDEX IF NOT EXISTS idx_channels_favourite ON channels(favourite);
"#;
