//! The vote transition engine.
//!
//! Governs create / edit / withdraw of a voter's full response set and
//! enforces the invariant of at most one live response set per
//! (poll, voter email). The storage layer has no awareness of this
//! state machine; it is observed only through this service.

use std::collections::HashMap;

use chrono::Utc;
use schedpoll_common::{AppError, AppResult, IdGenerator};
use schedpoll_db::{
    entities::{VoteValue, vote},
    repositories::{PollRepository, VoteRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::voter::{VoterResolver, normalize_email};

/// Per-(poll, voter) state, derived from storage.
///
/// `Editing` exists only in memory (a client holding the edit form);
/// it has no storage effect. `Withdrawn` is terminal until a fresh
/// submission re-enters `New`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoterState {
    /// No prior vote rows.
    New,
    /// A response set is stored.
    Submitted,
    /// The voter asked to revise; rows still stored, unchanged.
    Editing,
    /// All rows removed.
    Withdrawn,
}

/// Operations on the state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VoteOp {
    /// First-time submission of a response set.
    Submit,
    /// Open the stored set for revision (no storage effect).
    BeginEdit,
    /// Replace the stored set wholesale.
    Resubmit,
    /// Remove the stored set.
    Withdraw,
}

impl VoterState {
    /// Derive the stored state from the voter's current row count.
    #[must_use]
    pub const fn from_row_count(rows: usize) -> Self {
        if rows == 0 { Self::New } else { Self::Submitted }
    }

    /// Apply an operation, rejecting illegal transitions.
    pub fn apply(self, op: VoteOp) -> AppResult<Self> {
        match (self, op) {
            (Self::New | Self::Withdrawn, VoteOp::Submit) => Ok(Self::Submitted),
            (Self::Submitted | Self::Editing, VoteOp::BeginEdit) => Ok(Self::Editing),
            (Self::Submitted | Self::Editing, VoteOp::Resubmit) => Ok(Self::Submitted),
            (Self::Submitted | Self::Editing | Self::Withdrawn, VoteOp::Withdraw) => {
                Ok(Self::Withdrawn)
            }
            // Withdrawing with nothing stored is a no-op, not an error
            (Self::New, VoteOp::Withdraw) => Ok(Self::Withdrawn),
            (Self::Submitted | Self::Editing, VoteOp::Submit) => Err(AppError::Conflict(
                "A response already exists for this email; edit it instead".to_string(),
            )),
            (Self::New | Self::Withdrawn, VoteOp::Resubmit | VoteOp::BeginEdit) => {
                Err(AppError::Conflict(
                    "No existing response to edit for this email".to_string(),
                ))
            }
        }
    }
}

/// One answered option in a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEntry {
    /// The answer.
    pub value: VoteValue,
    /// Optional free-text comment for this option.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Vote lifecycle service.
#[derive(Clone)]
pub struct VoteService {
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
    resolver: VoterResolver,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        vote_repo: VoteRepository,
        resolver: VoterResolver,
    ) -> Self {
        Self {
            poll_repo,
            vote_repo,
            resolver,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a first-time response set.
    ///
    /// `responses` maps option id to an answer; options not present
    /// carry no opinion and produce no row. Rejects when the name is
    /// empty, the email is malformed, no option is answered, or any
    /// option id does not belong to the poll.
    pub async fn submit(
        &self,
        poll_id: &str,
        name: &str,
        email: &str,
        responses: HashMap<String, ResponseEntry>,
    ) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be empty".to_string()));
        }
        let email = validate_email(email)?;
        self.validate_responses(poll_id, &responses).await?;

        let existing = self.vote_repo.find_by_poll_and_voter(poll_id, &email).await?;
        VoterState::from_row_count(existing.len()).apply(VoteOp::Submit)?;

        let models = self.build_rows(poll_id, name, &email, responses);
        self.vote_repo.insert_set(poll_id, models).await?;

        tracing::debug!(poll_id, voter = %email, "Response set submitted");
        Ok(())
    }

    /// Replace an existing response set wholesale.
    ///
    /// Only valid when a prior set exists; the stored voter name is
    /// reused. Observable as all-or-nothing: the replacement runs in
    /// one storage transaction, so readers never see zero rows or a
    /// mix of old and new. Safe to retry with the same responses
    /// (idempotent wholesale replacement).
    pub async fn resubmit(
        &self,
        poll_id: &str,
        email: &str,
        responses: HashMap<String, ResponseEntry>,
    ) -> AppResult<()> {
        let email = validate_email(email)?;
        self.validate_responses(poll_id, &responses).await?;

        let existing = self.vote_repo.find_by_poll_and_voter(poll_id, &email).await?;
        VoterState::from_row_count(existing.len()).apply(VoteOp::Resubmit)?;

        // The prior rows all carry the same name; keep it.
        let name = existing
            .first()
            .map(|v| v.voter_name.clone())
            .unwrap_or_default();

        let models = self.build_rows(poll_id, &name, &email, responses);
        self.vote_repo
            .replace_set_for_voter(poll_id, &email, models)
            .await?;

        tracing::debug!(poll_id, voter = %email, "Response set replaced");
        Ok(())
    }

    /// Withdraw the voter's entire response set. Idempotent:
    /// withdrawing twice is a no-op, not an error.
    pub async fn withdraw(&self, poll_id: &str, email: &str) -> AppResult<()> {
        let email = validate_email(email)?;
        let removed = self.vote_repo.delete_for_voter(poll_id, &email).await?;
        tracing::debug!(poll_id, voter = %email, removed, "Response set withdrawn");
        Ok(())
    }

    /// The resolver used to detect a returning voter.
    #[must_use]
    pub const fn resolver(&self) -> &VoterResolver {
        &self.resolver
    }

    /// Reject responses that are empty or reference options outside
    /// the poll.
    async fn validate_responses(
        &self,
        poll_id: &str,
        responses: &HashMap<String, ResponseEntry>,
    ) -> AppResult<()> {
        if responses.is_empty() {
            return Err(AppError::Validation(
                "Vote on at least one option".to_string(),
            ));
        }

        // Also confirms the poll itself exists.
        self.poll_repo.get_by_id(poll_id).await?;
        let options = self.poll_repo.find_options(poll_id).await?;

        for option_id in responses.keys() {
            if !options.iter().any(|o| &o.id == option_id) {
                return Err(AppError::Validation(format!(
                    "Option does not belong to this poll: {option_id}"
                )));
            }
        }
        Ok(())
    }

    fn build_rows(
        &self,
        poll_id: &str,
        name: &str,
        email: &str,
        responses: HashMap<String, ResponseEntry>,
    ) -> Vec<vote::ActiveModel> {
        let now = Utc::now();
        responses
            .into_iter()
            .map(|(option_id, entry)| vote::ActiveModel {
                id: Set(self.id_gen.generate()),
                poll_id: Set(poll_id.to_string()),
                option_id: Set(option_id),
                voter_name: Set(name.to_string()),
                voter_email: Set(email.to_string()),
                vote: Set(entry.value),
                comment: Set(entry
                    .comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())),
                created_at: Set(now.into()),
            })
            .collect()
    }
}

fn validate_email(raw: &str) -> AppResult<String> {
    let email = normalize_email(raw);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(email)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_row_count() {
        assert_eq!(VoterState::from_row_count(0), VoterState::New);
        assert_eq!(VoterState::from_row_count(3), VoterState::Submitted);
    }

    #[test]
    fn test_legal_transitions() {
        assert_eq!(
            VoterState::New.apply(VoteOp::Submit).unwrap(),
            VoterState::Submitted
        );
        assert_eq!(
            VoterState::Submitted.apply(VoteOp::BeginEdit).unwrap(),
            VoterState::Editing
        );
        assert_eq!(
            VoterState::Editing.apply(VoteOp::Resubmit).unwrap(),
            VoterState::Submitted
        );
        assert_eq!(
            VoterState::Submitted.apply(VoteOp::Withdraw).unwrap(),
            VoterState::Withdrawn
        );
        // Withdrawn voter may submit fresh
        assert_eq!(
            VoterState::Withdrawn.apply(VoteOp::Submit).unwrap(),
            VoterState::Submitted
        );
    }

    #[test]
    fn test_withdraw_is_always_legal() {
        // Idempotent: withdrawing with nothing stored is a no-op
        assert_eq!(
            VoterState::New.apply(VoteOp::Withdraw).unwrap(),
            VoterState::Withdrawn
        );
        assert_eq!(
            VoterState::Withdrawn.apply(VoteOp::Withdraw).unwrap(),
            VoterState::Withdrawn
        );
    }

    #[test]
    fn test_illegal_transitions_are_rejected() {
        assert!(matches!(
            VoterState::Submitted.apply(VoteOp::Submit),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            VoterState::New.apply(VoteOp::Resubmit),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            VoterState::Withdrawn.apply(VoteOp::BeginEdit),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("   ").is_err());
    }
}
