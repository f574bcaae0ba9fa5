//! Application state shared across handlers.

use std::sync::Arc;

use schedpoll_core::{
    AccessGate, PollService, ResultsChannel, VoteService, VoterResolver,
};
use schedpoll_db::{
    change_feed::ChangeFeed,
    repositories::{PollRepository, VoteRepository},
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Poll creation and retrieval.
    pub poll_service: PollService,
    /// The vote transition engine.
    pub vote_service: VoteService,
    /// Returning-voter detection.
    pub resolver: VoterResolver,
    /// Admin-token gate on results.
    pub gate: AccessGate,
    /// One-shot and live ranked results.
    pub results: ResultsChannel,
}

impl AppState {
    /// Wire up all services over one database connection and change
    /// feed.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, feed: ChangeFeed) -> Self {
        let poll_repo = PollRepository::new(db.clone());
        let vote_repo = VoteRepository::new(db, feed);
        let resolver = VoterResolver::new(vote_repo.clone());

        Self {
            poll_service: PollService::new(poll_repo.clone()),
            vote_service: VoteService::new(
                poll_repo.clone(),
                vote_repo.clone(),
                resolver.clone(),
            ),
            resolver,
            gate: AccessGate::new(poll_repo.clone()),
            results: ResultsChannel::new(poll_repo, vote_repo),
        }
    }
}
