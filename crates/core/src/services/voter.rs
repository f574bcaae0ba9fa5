//! Voter identity resolution.
//!
//! A voter has no account; their normalized email is their identity
//! key. Resolution lets the UI detect a returning voter before any
//! voting form is shown, so a second independent response never
//! accumulates silently.

use schedpoll_common::AppResult;
use schedpoll_db::{entities::vote, repositories::VoteRepository};

/// Normalize an email into the identity key used everywhere else:
/// trimmed and lowercased.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Resolves a voter's existing response set by email.
#[derive(Clone)]
pub struct VoterResolver {
    vote_repo: VoteRepository,
}

impl VoterResolver {
    /// Create a new resolver.
    #[must_use]
    pub const fn new(vote_repo: VoteRepository) -> Self {
        Self { vote_repo }
    }

    /// Return the voter's full current response set for the poll, or
    /// an empty vector if they have never responded (or withdrew).
    /// No side effects.
    pub async fn resolve(&self, poll_id: &str, email: &str) -> AppResult<Vec<vote::Model>> {
        let email = normalize_email(email);
        self.vote_repo.find_by_poll_and_voter(poll_id, &email).await
    }
}
