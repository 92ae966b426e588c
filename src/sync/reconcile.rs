use std::collections::HashSet;

use crate::models::{Channel, Entry, RetentionStrategy};

/// What a refresh does to the stored channels of one playlist.
///
/// Deletions must be applied before insertions so that a channel moving
/// between groups does not collide with its own url.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Urls of stored channels to remove, in stored order.
    pub to_delete: Vec<String>,
    /// Fresh channels to write, in document order.
    pub to_insert: Vec<Channel>,
    /// Candidates that are still present in the fresh list and stay as they are.
    pub skipped: Vec<String>,
}

/// Diff the stored channels of `playlist_url` against a freshly parsed list.
///
/// Channels are matched by url only. Favourites are never candidates under
/// [`RetentionStrategy::SkipFavorite`] and are never written again.
pub fn reconcile(
    playlist_url: &str,
    strategy: RetentionStrategy,
    existing: &[Channel],
    fresh: Vec<Entry>,
) -> Reconciliation {
    let fresh_urls: HashSet<&str> = fresh.iter().map(|e| e.url.as_str()).collect();
    let (favourited, others): (Vec<&Channel>, Vec<&Channel>) =
        existing.iter().partition(|c| c.favourite);

    let candidates: Vec<&Channel> = match strategy {
        RetentionStrategy::All => existing.iter().collect(),
        RetentionStrategy::SkipFavorite => others,
        RetentionStrategy::KeepAll => Vec::new(),
    };

    let mut skipped = Vec::new();
    let mut to_delete = Vec::new();
    for channel in candidates {
        if fresh_urls.contains(channel.url.as_str()) {
            skipped.push(channel.url.clone());
        } else {
            to_delete.push(channel.url.clone());
        }
    }

    let mut existed: HashSet<&str> = skipped.iter().map(String::as_str).collect();
    if strategy == RetentionStrategy::SkipFavorite {
        existed.extend(favourited.iter().map(|c| c.url.as_str()));
    }

    let to_insert: Vec<Channel> = fresh
        .into_iter()
        .filter(|e| !existed.contains(e.url.as_str()))
        .map(|e| e.into_channel(playlist_url))
        .collect();

    tracing::debug!(
        "Reconciled {} with {}: {} to delete, {} to insert, {} kept",
        playlist_url,
        strategy,
        to_delete.len(),
        to_insert.len(),
        skipped.len()
    );

    Reconciliation {
        to_delete,
        to_insert,
        skipped,
    }
}
