//! API endpoints.

pub mod polls;
pub mod results;
pub mod votes;

use axum::Router;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api/polls",
        polls::router()
            .merge(votes::router())
            .merge(results::router()),
    )
}
