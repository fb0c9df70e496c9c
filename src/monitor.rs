//! Polling loop driving the reveal watch
//!
//! One sequential task: load the watch-list (retrying until it is
//! provisioned), announce the starting size, then poll every token each pass.
//! Confirmed reveals are announced and removed; everything else — still
//! hidden or could-not-determine — stays pending and is retried next pass.
//! The pending sublist is persisted after every pass, so no token is ever
//! dropped without either a reveal announcement or persistence.

use crate::animation;
use crate::classifier;
use crate::config::Config;
use crate::errors::{FetchError, WatchlistError};
use crate::logger::{self, LogTag};
use crate::metadata::{MetadataClient, RevealMetadata};
use crate::telegram::formatters;
use crate::telegram::RevealNotifier;
use crate::watchlist::WatchlistStore;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;

/// Result of one polling pass over the watch-list snapshot
#[derive(Debug)]
pub struct PassOutcome {
    /// Tokens to keep watching, in original order
    pub pending: Vec<u64>,
    /// Confirmed reveals with their metadata, in original order
    pub revealed: Vec<(u64, RevealMetadata)>,
}

/// Fetch and classify every token sequentially.
///
/// A fetch failure keeps the token pending (unknown is not revealed); a
/// confirmed `isRevealed: false` keeps it pending; anything else present is
/// a confirmed reveal.
pub async fn poll_pass<F, Fut>(tokens: &[u64], fetch: F) -> PassOutcome
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<RevealMetadata, FetchError>>,
{
    let mut pending = Vec::new();
    let mut revealed = Vec::new();

    for &token_id in tokens {
        logger::debug(LogTag::Monitor, &format!("checking token #{}", token_id));
        match fetch(token_id).await {
            Ok(metadata) if classifier::is_unrevealed(Some(&metadata)) => {
                logger::debug(
                    LogTag::Monitor,
                    &format!("token #{} still unrevealed", token_id),
                );
                pending.push(token_id);
            }
            Ok(metadata) => {
                logger::info(LogTag::Monitor, &format!("token #{} revealed!", token_id));
                revealed.push((token_id, metadata));
            }
            Err(e) => {
                logger::warning(
                    LogTag::Monitor,
                    &format!("token #{}: no metadata ({}), keeping in list", token_id, e),
                );
                pending.push(token_id);
            }
        }
    }

    PassOutcome { pending, revealed }
}

// ============================================================================
// MONITOR
// ============================================================================

pub struct Monitor {
    config: Arc<Config>,
    client: MetadataClient,
    notifier: RevealNotifier,
    store: WatchlistStore,
    shutdown: Arc<Notify>,
}

impl Monitor {
    pub fn new(
        config: Arc<Config>,
        client: MetadataClient,
        notifier: RevealNotifier,
        shutdown: Arc<Notify>,
    ) -> Self {
        let store = WatchlistStore::new(config.watchlist_path.clone());
        Self {
            config,
            client,
            notifier,
            store,
            shutdown,
        }
    }

    /// Run the monitoring loop to completion: terminates when every watched
    /// token has revealed, the load retry budget is exhausted, or shutdown
    /// is signalled.
    pub async fn run(&self) -> Result<(), WatchlistError> {
        // AwaitingList: wait for the externally provisioned watch-list
        let mut tokens = self
            .store
            .load_with_retry(
                self.config.watchlist_retry_delay,
                self.config.watchlist_max_retries,
                &self.shutdown,
            )
            .await?;

        logger::info(
            LogTag::Monitor,
            &format!(
                "loaded {} unrevealed tokens from {}",
                tokens.len(),
                self.store.path().display()
            ),
        );

        if tokens.is_empty() {
            logger::info(LogTag::Monitor, "no unrevealed tokens to monitor");
            return Ok(());
        }

        // Announcing: one startup summary
        let startup = formatters::format_startup_message(tokens.len(), &self.config);
        if let Err(e) = self.notifier.send_message(&startup).await {
            logger::warning(
                LogTag::Telegram,
                &format!("failed to send startup message: {}", e),
            );
        }

        // Polling until the list drains
        loop {
            logger::info(
                LogTag::Monitor,
                &format!("polling {} unrevealed tokens", tokens.len()),
            );

            let outcome = poll_pass(&tokens, |id| self.client.fetch_reveal_metadata(id)).await;

            for (token_id, metadata) in &outcome.revealed {
                self.announce_reveal(*token_id, metadata).await;
            }

            if let Err(e) = self.store.save(&outcome.pending) {
                // Keep the in-memory list authoritative; retry persisting
                // on the next pass.
                logger::error(
                    LogTag::Watchlist,
                    &format!("failed to persist watch-list: {}", e),
                );
            }
            tokens = outcome.pending;

            if tokens.is_empty() {
                logger::info(LogTag::Monitor, "all tokens revealed, monitoring complete");
                return Ok(());
            }

            logger::info(
                LogTag::Monitor,
                &format!(
                    "{} tokens still hidden, next pass in {}s",
                    tokens.len(),
                    self.config.check_interval.as_secs()
                ),
            );

            tokio::select! {
                _ = tokio::time::sleep(self.config.check_interval) => {}
                _ = self.shutdown.notified() => {
                    logger::info(LogTag::Monitor, "shutdown signalled, monitoring stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Send the reveal announcement for one token: animation when it can be
    /// composed, else the final image, else a text-only message.
    async fn announce_reveal(&self, token_id: u64, metadata: &RevealMetadata) {
        let message = formatters::format_reveal_message(token_id, metadata, &self.config);

        let gif = animation::compose_reveal_gif(
            self.client.http(),
            &self.config.images_dir,
            metadata.image.as_deref(),
            token_id,
        )
        .await;

        let sent = match gif {
            Some(buffer) => {
                self.notifier
                    .send_animation(
                        buffer,
                        format!("reveal_{}.gif", token_id),
                        &message.caption,
                    )
                    .await
            }
            None => match metadata.image.as_deref() {
                Some(url) => self.notifier.send_photo_url(url, &message.caption).await,
                None => {
                    self.notifier
                        .send_photo_url(&self.config.brand_image_url, &message.caption)
                        .await
                }
            },
        };

        if let Err(e) = sent {
            logger::error(
                LogTag::Telegram,
                &format!("token #{}: failed to send reveal visual: {}", token_id, e),
            );
            // Last resort: plain text so the reveal is still announced
            if let Err(e) = self.notifier.send_message(&message.caption).await {
                logger::error(
                    LogTag::Telegram,
                    &format!("token #{}: reveal announcement lost: {}", token_id, e),
                );
            }
        }

        for block in &message.extra_blocks {
            if let Err(e) = self.notifier.send_message(block).await {
                logger::error(
                    LogTag::Telegram,
                    &format!("token #{}: failed to send trait block: {}", token_id, e),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(body: serde_json::Value) -> RevealMetadata {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn pass_partitions_hidden_and_revealed() {
        let tokens = [101u64, 102];

        let outcome = poll_pass(&tokens, |id| async move {
            match id {
                101 => Ok(meta(json!({ "isRevealed": false }))),
                102 => Ok(meta(json!({
                    "isRevealed": true,
                    "image": "http://x/102.png",
                    "attributes": [{"trait_type": "Fur", "value": "Blue"}]
                }))),
                _ => unreachable!(),
            }
        })
        .await;

        assert_eq!(outcome.pending, vec![101]);
        assert_eq!(outcome.revealed.len(), 1);
        assert_eq!(outcome.revealed[0].0, 102);
        assert_eq!(outcome.revealed[0].1.image.as_deref(), Some("http://x/102.png"));
    }

    #[tokio::test]
    async fn fetch_failure_keeps_token_pending() {
        let tokens = [7u64];

        let outcome = poll_pass(&tokens, |_| async {
            Err(FetchError::Malformed("simulated network error".into()))
        })
        .await;

        assert_eq!(outcome.pending, vec![7]);
        assert!(outcome.revealed.is_empty());
    }

    #[tokio::test]
    async fn missing_reveal_field_counts_as_revealed() {
        // Metadata present without isRevealed is not "confirmed hidden"
        let tokens = [5u64];

        let outcome = poll_pass(&tokens, |_| async { Ok(meta(json!({}))) }).await;

        assert!(outcome.pending.is_empty());
        assert_eq!(outcome.revealed.len(), 1);
    }

    #[tokio::test]
    async fn pass_preserves_list_order() {
        let tokens = [3u64, 1, 2, 9];

        let outcome = poll_pass(&tokens, |id| async move {
            if id % 2 == 1 {
                Ok(meta(json!({ "isRevealed": false })))
            } else {
                Ok(meta(json!({ "isRevealed": true })))
            }
        })
        .await;

        assert_eq!(outcome.pending, vec![3, 1, 9]);
        let revealed_ids: Vec<u64> = outcome.revealed.iter().map(|(id, _)| *id).collect();
        assert_eq!(revealed_ids, vec![2]);
    }
}
