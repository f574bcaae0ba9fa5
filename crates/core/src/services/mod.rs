//! Core services.

pub mod access;
pub mod poll;
pub mod results;
pub mod scoring;
pub mod vote;
pub mod voter;

pub use access::AccessGate;
pub use poll::{CreatePollInput, NewPollOption, PollCreated, PollService, PollView};
pub use results::{ResultsChannel, ResultsSubscription};
pub use scoring::{OptionTally, RankedResult, rank};
pub use vote::{ResponseEntry, VoteOp, VoteService, VoterState};
pub use voter::{VoterResolver, normalize_email};
