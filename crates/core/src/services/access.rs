//! The access gate on aggregate results.
//!
//! A capability check, not an identity system: possession of the
//! admin token is the only credential.

use schedpoll_common::{AppError, AppResult};
use schedpoll_db::{entities::poll, repositories::PollRepository};

/// Authorizes result access by admin token.
#[derive(Clone)]
pub struct AccessGate {
    poll_repo: PollRepository,
}

impl AccessGate {
    /// Create a new access gate.
    #[must_use]
    pub const fn new(poll_repo: PollRepository) -> Self {
        Self { poll_repo }
    }

    /// Release the poll only on an exact whole-string token match.
    ///
    /// A missing poll and a wrong token produce the same content-free
    /// [`AppError::Unauthorized`], so the gate never reveals whether
    /// the poll exists.
    pub async fn authorize(&self, poll_id: &str, presented_token: &str) -> AppResult<poll::Model> {
        let Some(poll) = self.poll_repo.find_by_id(poll_id).await? else {
            return Err(AppError::Unauthorized);
        };

        if poll.admin_token == presented_token {
            Ok(poll)
        } else {
            Err(AppError::Unauthorized)
        }
    }
}
