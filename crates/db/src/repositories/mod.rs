//! Typed repositories over the three record kinds.

pub mod poll;
pub mod vote;

pub use poll::PollRepository;
pub use vote::VoteRepository;
