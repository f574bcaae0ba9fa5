//! Scoring and ranking over a poll's full vote set.
//!
//! A pure function of total state: every observed change re-runs the
//! whole computation instead of patching incremental counters, which
//! removes an entire class of drift bugs at a CPU cost that is
//! negligible for per-poll vote volumes.

use std::collections::HashSet;

use chrono::NaiveDate;
use schedpoll_db::entities::{VoteValue, poll_option, vote};
use serde::{Deserialize, Serialize};

/// Per-option tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTally {
    /// The option this tally belongs to.
    pub option_id: String,
    /// Calendar date of the slot.
    pub date: NaiveDate,
    /// Display time range; `None` means "any time that day".
    pub time_slot: Option<String>,
    /// Number of yes votes.
    pub yes: u32,
    /// Number of no votes.
    pub no: u32,
    /// Number of maybe votes.
    pub maybe: u32,
    /// Total responses for this option. Voters with no row for the
    /// option are absent here, not counted as "no".
    pub total: u32,
    /// Preference score: `yes + 0.5 * maybe`.
    pub score: f64,
}

/// The aggregate a results observer sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// One tally per option, in display order (date, then time range).
    pub options: Vec<OptionTally>,
    /// The option with the strictly highest score; ties go to the
    /// first occurrence in display order. `None` when no votes exist.
    pub best_option_id: Option<String>,
    /// Number of distinct voters across all options.
    pub responder_count: usize,
}

/// Compute tallies and the best option for a poll.
///
/// `options` must already be in display order (date ascending, then
/// time range ascending); the tie-break leans on that ordering.
/// Deterministic and side-effect-free so it can be re-run on every
/// update without accumulating drift.
#[must_use]
pub fn rank(options: &[poll_option::Model], votes: &[vote::Model]) -> RankedResult {
    let tallies: Vec<OptionTally> = options
        .iter()
        .map(|opt| {
            let mut yes = 0u32;
            let mut no = 0u32;
            let mut maybe = 0u32;
            for v in votes.iter().filter(|v| v.option_id == opt.id) {
                match v.vote {
                    VoteValue::Yes => yes += 1,
                    VoteValue::No => no += 1,
                    VoteValue::Maybe => maybe += 1,
                }
            }
            OptionTally {
                option_id: opt.id.clone(),
                date: opt.date,
                time_slot: opt.time_slot.clone(),
                yes,
                no,
                maybe,
                total: yes + no + maybe,
                score: f64::from(yes) + 0.5 * f64::from(maybe),
            }
        })
        .collect();

    let responder_count = votes
        .iter()
        .map(|v| v.voter_email.as_str())
        .collect::<HashSet<_>>()
        .len();

    // Strictly-greater comparison keeps the earliest option on ties.
    let best_option_id = if votes.is_empty() {
        None
    } else {
        let mut best: Option<&OptionTally> = None;
        for tally in &tallies {
            match best {
                Some(b) if tally.score <= b.score => {}
                _ => best = Some(tally),
            }
        }
        best.map(|t| t.option_id.clone())
    };

    RankedResult {
        options: tallies,
        best_option_id,
        responder_count,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn option(id: &str, date: &str, slot: Option<&str>) -> poll_option::Model {
        poll_option::Model {
            id: id.to_string(),
            poll_id: "p1".to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_slot: slot.map(String::from),
        }
    }

    fn ballot(option_id: &str, email: &str, value: VoteValue) -> vote::Model {
        vote::Model {
            id: format!("{option_id}-{email}"),
            poll_id: "p1".to_string(),
            option_id: option_id.to_string(),
            voter_name: email.split('@').next().unwrap_or("x").to_string(),
            voter_email: email.to_string(),
            vote: value,
            comment: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_score_ignores_no_votes() {
        let options = vec![option("o1", "2025-03-01", None)];
        let votes = vec![
            ballot("o1", "a@x.com", VoteValue::Yes),
            ballot("o1", "b@x.com", VoteValue::Maybe),
            ballot("o1", "c@x.com", VoteValue::No),
            ballot("o1", "d@x.com", VoteValue::No),
            ballot("o1", "e@x.com", VoteValue::No),
        ];

        let result = rank(&options, &votes);
        let tally = &result.options[0];
        assert_eq!(tally.yes, 1);
        assert_eq!(tally.maybe, 1);
        assert_eq!(tally.no, 3);
        assert_eq!(tally.total, 5);
        // y + 0.5*m, independent of the no-count
        assert_eq!(tally.score, 1.5);
    }

    #[test]
    fn test_no_votes_means_no_best_option() {
        let options = vec![
            option("o1", "2025-03-01", None),
            option("o2", "2025-03-02", None),
        ];
        let result = rank(&options, &[]);
        assert_eq!(result.best_option_id, None);
        assert_eq!(result.responder_count, 0);
        assert_eq!(result.options.len(), 2);
    }

    #[test]
    fn test_tie_breaks_to_earliest_option() {
        let options = vec![
            option("o1", "2025-03-01", None),
            option("o2", "2025-03-02", None),
        ];
        let votes = vec![
            ballot("o1", "a@x.com", VoteValue::Yes),
            ballot("o2", "b@x.com", VoteValue::Yes),
        ];

        let result = rank(&options, &votes);
        assert_eq!(result.best_option_id.as_deref(), Some("o1"));
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let options = vec![
            option("o1", "2025-03-01", None),
            option("o2", "2025-03-02", None),
        ];
        let mut votes = vec![
            ballot("o1", "a@x.com", VoteValue::Yes),
            ballot("o2", "a@x.com", VoteValue::Maybe),
            ballot("o1", "b@x.com", VoteValue::No),
            ballot("o2", "b@x.com", VoteValue::Yes),
        ];

        let forward = rank(&options, &votes);
        votes.reverse();
        let backward = rank(&options, &votes);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_responder_count_spans_options() {
        let options = vec![
            option("o1", "2025-03-01", None),
            option("o2", "2025-03-02", None),
        ];
        // One voter answered both options, one answered only the second
        let votes = vec![
            ballot("o1", "a@x.com", VoteValue::Yes),
            ballot("o2", "a@x.com", VoteValue::Yes),
            ballot("o2", "b@x.com", VoteValue::Maybe),
        ];

        let result = rank(&options, &votes);
        assert_eq!(result.responder_count, 2);
    }

    #[test]
    fn test_absent_votes_are_not_counted_as_no() {
        // An option added after some voters responded simply has no
        // rows for them.
        let options = vec![
            option("o1", "2025-03-01", None),
            option("o2", "2025-03-02", None),
        ];
        let votes = vec![ballot("o1", "a@x.com", VoteValue::Yes)];

        let result = rank(&options, &votes);
        let late = &result.options[1];
        assert_eq!(late.no, 0);
        assert_eq!(late.total, 0);
    }

    #[test]
    fn test_standup_scenario() {
        // Poll "Standup": two morning slots on consecutive days.
        let options = vec![
            option("opt1", "2025-03-01", Some("9:00 AM - 9:30 AM")),
            option("opt2", "2025-03-02", Some("9:00 AM - 9:30 AM")),
        ];

        // Voter A: {opt1: yes, opt2: maybe}
        let mut votes = vec![
            ballot("opt1", "a@x.com", VoteValue::Yes),
            ballot("opt2", "a@x.com", VoteValue::Maybe),
        ];
        let result = rank(&options, &votes);
        assert_eq!(result.options[0].score, 1.0);
        assert_eq!(result.options[1].score, 0.5);
        assert_eq!(result.best_option_id.as_deref(), Some("opt1"));

        // Voter B joins: {opt1: no, opt2: yes}
        votes.push(ballot("opt1", "b@x.com", VoteValue::No));
        votes.push(ballot("opt2", "b@x.com", VoteValue::Yes));
        let result = rank(&options, &votes);
        assert_eq!(result.options[0].score, 1.0);
        assert_eq!(result.options[1].score, 1.5);
        assert_eq!(result.best_option_id.as_deref(), Some("opt2"));
        assert_eq!(result.responder_count, 2);

        // Voter A resubmits {opt1: yes} only, dropping their opt2 maybe
        votes.retain(|v| v.voter_email != "a@x.com");
        votes.push(ballot("opt1", "a@x.com", VoteValue::Yes));
        let result = rank(&options, &votes);
        assert_eq!(result.options[0].score, 1.0);
        assert_eq!(result.options[1].score, 1.0);
        // Tie resolved by date order
        assert_eq!(result.best_option_id.as_deref(), Some("opt1"));
    }
}
