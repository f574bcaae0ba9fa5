//! Database entities.

pub mod poll;
pub mod poll_option;
pub mod vote;

pub use poll::Entity as Poll;
pub use poll_option::Entity as PollOption;
pub use vote::Entity as Vote;
pub use vote::VoteValue;
