//! Poll and poll-option repository.

use std::sync::Arc;

use crate::entities::{Poll, PollOption, poll, poll_option};
use schedpoll_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, TransactionTrait, sea_query::NullOrdering,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, poll_id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(poll_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a poll by its short public code.
    pub async fn find_by_short_code(&self, short_code: &str) -> AppResult<Option<poll::Model>> {
        Poll::find()
            .filter(poll::Column::ShortCode.eq(short_code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning an error if not found.
    pub async fn get_by_id(&self, poll_id: &str) -> AppResult<poll::Model> {
        self.find_by_id(poll_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {poll_id}")))
    }

    /// Create a poll together with its options in one transaction.
    ///
    /// Options are immutable after this point for the voting phase, so
    /// a poll is never visible without its full option set.
    pub async fn create_with_options(
        &self,
        poll_model: poll::ActiveModel,
        option_models: Vec<poll_option::ActiveModel>,
    ) -> AppResult<poll::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = poll_model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !option_models.is_empty() {
            PollOption::insert_many(option_models)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(created)
    }

    /// List a poll's options in display order: date ascending, then
    /// time range ascending with "any time" (NULL) first. This
    /// ordering is also the ranking tie-break, so every reader must
    /// use it; NULL placement is pinned because Postgres and SQLite
    /// disagree on the default.
    pub async fn find_options(&self, poll_id: &str) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Date)
            .order_by_with_nulls(
                poll_option::Column::TimeSlot,
                Order::Asc,
                NullOrdering::First,
            )
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a poll (options and votes cascade).
    pub async fn delete(&self, poll_id: &str) -> AppResult<()> {
        Poll::delete_by_id(poll_id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
