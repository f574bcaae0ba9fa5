//! Common utilities and shared types for schedpoll.
//!
//! This crate provides foundational components used across all
//! schedpoll crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: entity ids, admin tokens and short poll codes
//!   via [`IdGenerator`]

pub mod config;
pub mod error;
pub mod id;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
