//! Poll service: creation and voter-facing retrieval.

use chrono::{NaiveDate, Utc};
use schedpoll_common::{AppError, AppResult, IdGenerator};
use schedpoll_db::{
    entities::{poll, poll_option},
    repositories::PollRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

const MAX_TITLE_LEN: usize = 256;

/// One candidate date/time slot at creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NewPollOption {
    /// Calendar date of the slot.
    pub date: NaiveDate,
    /// Display time range; `None` means "any time that day".
    #[serde(default)]
    pub time_slot: Option<String>,
}

/// Input for creating a poll.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePollInput {
    /// Poll title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Candidate slots.
    pub options: Vec<NewPollOption>,
}

/// What the creator gets back; the only moment the admin token is
/// ever surfaced.
#[derive(Debug, Clone, Serialize)]
pub struct PollCreated {
    /// The new poll's id.
    pub poll_id: String,
    /// The admin capability token.
    pub admin_token: String,
    /// The short shareable code.
    pub short_code: String,
}

/// A poll as shown to voters: no secrets.
#[derive(Debug, Clone, Serialize)]
pub struct PollView {
    /// Poll id.
    pub id: String,
    /// Poll title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Short shareable code.
    pub short_code: String,
    /// Options in display order.
    pub options: Vec<poll_option::Model>,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository) -> Self {
        Self {
            poll_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a poll with its options.
    ///
    /// The admin token and short code are generated exactly once,
    /// here; the token is never reissued or displayed again.
    /// Duplicate (date, time range) pairs collapse into one option.
    pub async fn create_poll(&self, input: CreatePollInput) -> AppResult<PollCreated> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "Title is too long (max {MAX_TITLE_LEN} chars)"
            )));
        }
        if input.options.is_empty() {
            return Err(AppError::Validation(
                "A poll needs at least one option".to_string(),
            ));
        }

        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Normalize slots into display order and drop duplicates of
        // the same logical slot.
        let mut slots: Vec<NewPollOption> = input
            .options
            .into_iter()
            .map(|o| NewPollOption {
                date: o.date,
                time_slot: o
                    .time_slot
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            })
            .collect();
        slots.sort();
        slots.dedup();

        let poll_id = self.id_gen.generate();
        let admin_token = self.id_gen.generate_token();
        let short_code = self.id_gen.generate_short_code();

        let poll_model = poll::ActiveModel {
            id: Set(poll_id.clone()),
            title: Set(title.to_string()),
            description: Set(description),
            short_code: Set(short_code.clone()),
            admin_token: Set(admin_token.clone()),
            created_at: Set(Utc::now().into()),
        };

        let option_models: Vec<poll_option::ActiveModel> = slots
            .into_iter()
            .map(|slot| poll_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                poll_id: Set(poll_id.clone()),
                date: Set(slot.date),
                time_slot: Set(slot.time_slot),
            })
            .collect();

        self.poll_repo
            .create_with_options(poll_model, option_models)
            .await?;

        tracing::info!(poll_id, short_code, "Poll created");
        Ok(PollCreated {
            poll_id,
            admin_token,
            short_code,
        })
    }

    /// Fetch a poll for the voting page by id or short code, with the
    /// admin token stripped.
    pub async fn get_poll_for_voting(&self, reference: &str) -> AppResult<PollView> {
        let poll = match self.poll_repo.find_by_id(reference).await? {
            Some(poll) => poll,
            None => self
                .poll_repo
                .find_by_short_code(reference)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Poll not found: {reference}")))?,
        };

        let options = self.poll_repo.find_options(&poll.id).await?;

        Ok(PollView {
            id: poll.id,
            title: poll.title,
            description: poll.description,
            short_code: poll.short_code,
            options,
        })
    }
}
