//! Vote repository.
//!
//! Owns every write path that touches vote rows. Each mutation
//! publishes on the change feed only after the transaction commits,
//! so observers never recompute against uncommitted state.

use std::sync::Arc;

use crate::change_feed::{ChangeEvent, ChangeFeed, ChangeOp};
use crate::entities::{Vote, vote};
use schedpoll_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
    feed: ChangeFeed,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// The change feed this repository publishes to.
    #[must_use]
    pub const fn change_feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// All vote rows for a poll.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A voter's current response set for a poll. The email must
    /// already be normalized (trimmed, lowercased).
    pub async fn find_by_poll_and_voter(
        &self,
        poll_id: &str,
        voter_email: &str,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PollId.eq(poll_id))
            .filter(vote::Column::VoterEmail.eq(voter_email))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a fresh response set in one transaction.
    pub async fn insert_set(
        &self,
        poll_id: &str,
        models: Vec<vote::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Err(AppError::BadRequest("Empty response set".to_string()));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Vote::insert_many(models)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.feed.publish(ChangeEvent {
            op: ChangeOp::Insert,
            poll_id: poll_id.to_string(),
        });
        Ok(())
    }

    /// Replace a voter's entire response set in one transaction.
    ///
    /// Delete-then-insert inside a single transaction: readers observe
    /// either the complete old set or the complete new set, never an
    /// empty or mixed state.
    pub async fn replace_set_for_voter(
        &self,
        poll_id: &str,
        voter_email: &str,
        models: Vec<vote::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Err(AppError::BadRequest("Empty response set".to_string()));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Vote::delete_many()
            .filter(vote::Column::PollId.eq(poll_id))
            .filter(vote::Column::VoterEmail.eq(voter_email))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Vote::insert_many(models)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.feed.publish(ChangeEvent {
            op: ChangeOp::Replace,
            poll_id: poll_id.to_string(),
        });
        Ok(())
    }

    /// Delete a voter's entire response set. Returns the number of
    /// rows removed; zero is not an error (withdraw is idempotent).
    pub async fn delete_for_voter(&self, poll_id: &str, voter_email: &str) -> AppResult<u64> {
        let result = Vote::delete_many()
            .filter(vote::Column::PollId.eq(poll_id))
            .filter(vote::Column::VoterEmail.eq(voter_email))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected > 0 {
            self.feed.publish(ChangeEvent {
                op: ChangeOp::Delete,
                poll_id: poll_id.to_string(),
            });
        }
        Ok(result.rows_affected)
    }
}
