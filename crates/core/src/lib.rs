//! Core business logic for schedpoll.

pub mod services;

pub use services::*;
