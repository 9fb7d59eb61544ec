//! Trailing-window de-duplication of provider message ids.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// How long a message id is remembered.
pub const DEDUP_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Set of recently seen message ids. Entries expire after the window and
/// are purged lazily on access.
#[derive(Debug)]
pub struct DedupSet {
    window: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl Default for DedupSet {
    fn default() -> Self {
        Self::new(DEDUP_WINDOW)
    }
}

impl DedupSet {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record `id` and return true if it was not seen within the window.
    pub async fn check_and_insert(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        self.purge(&mut seen, now);

        if seen.contains_key(id) {
            return false;
        }
        seen.insert(id.to_string(), now);
        true
    }

    /// Remember an id without checking it, e.g. for messages the bot sent.
    pub async fn insert(&self, id: &str) {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        self.purge(&mut seen, now);
        seen.insert(id.to_string(), now);
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let mut seen = self.seen.lock().await;
        self.purge(&mut seen, Instant::now());
        seen.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn purge(&self, seen: &mut HashMap<String, Instant>, now: Instant) {
        seen.retain(|_, at| now.duration_since(*at) < self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_within_window() {
        let dedup = DedupSet::default();
        assert!(dedup.check_and_insert("3EB0A1").await);
        assert!(!dedup.check_and_insert("3EB0A1").await);
        assert!(dedup.check_and_insert("3EB0A2").await);

        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        assert!(!dedup.check_and_insert("3EB0A1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let dedup = DedupSet::default();
        dedup.insert("SENT-1").await;
        assert_eq!(dedup.len().await, 1);

        tokio::time::advance(DEDUP_WINDOW + Duration::from_secs(1)).await;
        assert!(dedup.is_empty().await);
        assert!(dedup.check_and_insert("SENT-1").await);
    }
}
