//! HTTP API layer for schedpoll.
//!
//! Exposes the public operation surface over REST plus a Server-Sent
//! Events stream for live ranked results. Built on Axum with a Tower
//! middleware stack.

pub mod endpoints;
pub mod response;
pub mod state;

pub use endpoints::router;
pub use state::AppState;
