//! Persisted watch-list of unrevealed token ids
//!
//! The sole durable state of the system: a JSON array of token ids, created
//! externally before first run, loaded at startup and rewritten after every
//! polling pass. Single writer, so a temp-file + rename is atomic enough.

use crate::errors::WatchlistError;
use crate::logger::{self, LogTag};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Notify;

pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted list. Order is preserved; duplicate ids are
    /// dropped (first occurrence wins) to uphold the at-most-once invariant.
    pub fn load(&self) -> Result<Vec<u64>, WatchlistError> {
        let content = fs::read_to_string(&self.path)?;
        let raw: Vec<u64> = serde_json::from_str(&content)?;

        let mut seen = HashSet::new();
        let tokens: Vec<u64> = raw.into_iter().filter(|id| seen.insert(*id)).collect();
        Ok(tokens)
    }

    /// Retry `load` at a fixed delay until it succeeds, the attempt budget
    /// is exhausted, or shutdown is signalled.
    ///
    /// The unbounded default deliberately waits for the list file to be
    /// provisioned externally.
    pub async fn load_with_retry(
        &self,
        delay: Duration,
        max_attempts: Option<u32>,
        shutdown: &Notify,
    ) -> Result<Vec<u64>, WatchlistError> {
        let mut attempts: u32 = 0;

        loop {
            match self.load() {
                Ok(tokens) => return Ok(tokens),
                Err(e) => {
                    attempts += 1;
                    if let Some(max) = max_attempts {
                        if attempts >= max {
                            return Err(WatchlistError::RetriesExhausted(attempts));
                        }
                    }
                    logger::warning(
                        LogTag::Watchlist,
                        &format!(
                            "failed to load {} ({}), retrying in {}s",
                            self.path.display(),
                            e,
                            delay.as_secs()
                        ),
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.notified() => return Err(WatchlistError::Cancelled),
            }
        }
    }

    /// Overwrite the persisted list via temp file + rename.
    pub fn save(&self, tokens: &[u64]) -> Result<(), WatchlistError> {
        let content = serde_json::to_string(tokens)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;

        logger::debug(
            LogTag::Watchlist,
            &format!("persisted {} pending tokens", tokens.len()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir) -> WatchlistStore {
        WatchlistStore::new(dir.path().join("watchlist.json"))
    }

    #[test]
    fn save_load_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let tokens = vec![101, 7, 4021, 2];
        store.save(&tokens).unwrap();
        assert_eq!(store.load().unwrap(), tokens);
    }

    #[test]
    fn empty_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&[]).unwrap();
        assert_eq!(store.load().unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn duplicates_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        fs::write(&path, "[5, 3, 5, 9, 3]").unwrap();

        let store = WatchlistStore::new(path);
        assert_eq!(store.load().unwrap(), vec![5, 3, 9]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.load(), Err(WatchlistError::Io(_))));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        fs::write(&path, "{not a list}").unwrap();

        let store = WatchlistStore::new(path);
        assert!(matches!(store.load(), Err(WatchlistError::Corrupt(_))));
    }

    #[tokio::test]
    async fn retry_is_bounded_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let shutdown = Notify::new();

        let result = store
            .load_with_retry(Duration::from_millis(1), Some(3), &shutdown)
            .await;
        assert!(matches!(result, Err(WatchlistError::RetriesExhausted(3))));
    }

    #[tokio::test]
    async fn retry_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let shutdown = Arc::new(Notify::new());

        let signaller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signaller.notify_waiters();
        });

        let result = store
            .load_with_retry(Duration::from_secs(60), None, &shutdown)
            .await;
        assert!(matches!(result, Err(WatchlistError::Cancelled)));
    }

    #[tokio::test]
    async fn retry_picks_up_late_provisioned_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        let store = WatchlistStore::new(path.clone());
        let shutdown = Notify::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            fs::write(&path, "[11, 12]").unwrap();
        });

        let tokens = store
            .load_with_retry(Duration::from_millis(5), None, &shutdown)
            .await
            .unwrap();
        assert_eq!(tokens, vec![11, 12]);
    }
}
