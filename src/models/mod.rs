mod channel;
mod playlist;
mod progress;
mod strategy;

pub use channel::{Channel, Entry};
pub use playlist::{Playlist, IMPORTED_PLAYLIST_URL};
pub use progress::ProgressResource;
pub use strategy::{ConnectTimeout, RetentionStrategy};
