//! Live delivery of ranked results.
//!
//! Bridges the storage change feed to observers: every committed vote
//! change for the watched poll triggers a full refetch and rerank,
//! and only the newest aggregate is retained for delivery
//! (last-result-wins; intermediate states may be skipped).

use schedpoll_common::AppResult;
use schedpoll_db::repositories::{PollRepository, VoteRepository};
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;

use super::scoring::{RankedResult, rank};

/// Produces one-shot and live ranked results for a poll.
#[derive(Clone)]
pub struct ResultsChannel {
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
}

impl ResultsChannel {
    /// Create a new results channel.
    #[must_use]
    pub const fn new(poll_repo: PollRepository, vote_repo: VoteRepository) -> Self {
        Self {
            poll_repo,
            vote_repo,
        }
    }

    /// Compute the current ranked result from storage truth.
    pub async fn current(&self, poll_id: &str) -> AppResult<RankedResult> {
        compute(&self.poll_repo, &self.vote_repo, poll_id).await
    }

    /// Subscribe to live ranked results for one poll.
    ///
    /// The subscription starts with a fresh snapshot and then receives
    /// a recomputed aggregate after every committed vote change for
    /// the poll. Changes to other polls never trigger delivery.
    pub async fn subscribe(&self, poll_id: &str) -> AppResult<ResultsSubscription> {
        let initial = self.current(poll_id).await?;
        let (tx, rx) = watch::channel(initial);

        let mut feed_rx = self.vote_repo.change_feed().subscribe();
        let poll_repo = self.poll_repo.clone();
        let vote_repo = self.vote_repo.clone();
        let poll_id = poll_id.to_string();

        let task = tokio::spawn(async move {
            loop {
                match feed_rx.recv().await {
                    Ok(event) if event.poll_id == poll_id => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        // Events were dropped; the unconditional
                        // recompute below resynchronizes with storage.
                        tracing::warn!(poll_id, skipped, "Change feed lagged, recomputing");
                    }
                    Err(RecvError::Closed) => break,
                }

                match compute(&poll_repo, &vote_repo, &poll_id).await {
                    Ok(result) => {
                        if tx.send(result).is_err() {
                            // Observer is gone.
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(poll_id, error = %e, "Recompute failed, keeping last result");
                    }
                }
            }
        });

        Ok(ResultsSubscription {
            rx,
            task,
            closed: false,
        })
    }
}

/// A live results subscription. Dropping it closes it.
pub struct ResultsSubscription {
    rx: watch::Receiver<RankedResult>,
    task: JoinHandle<()>,
    closed: bool,
}

impl ResultsSubscription {
    /// The most recently delivered result.
    #[must_use]
    pub fn latest(&self) -> RankedResult {
        self.rx.borrow().clone()
    }

    /// Wait for the next fresh result. Returns `None` once the
    /// subscription is closed.
    pub async fn next(&mut self) -> Option<RankedResult> {
        if self.closed {
            return None;
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Stop delivery and release the feed resource. Safe to call more
    /// than once; after the first call no further delivery occurs.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.task.abort();
        }
    }
}

impl Drop for ResultsSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

async fn compute(
    poll_repo: &PollRepository,
    vote_repo: &VoteRepository,
    poll_id: &str,
) -> AppResult<RankedResult> {
    let options = poll_repo.find_options(poll_id).await?;
    let votes = vote_repo.find_by_poll(poll_id).await?;
    Ok(rank(&options, &votes))
}
