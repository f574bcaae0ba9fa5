//! Database integration tests.
//!
//! Run against an in-memory SQLite database with real migrations, so
//! no external services are required.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use schedpoll_db::change_feed::{ChangeFeed, ChangeOp};
use schedpoll_db::entities::{VoteValue, poll, poll_option, vote};
use schedpoll_db::repositories::{PollRepository, VoteRepository};
use schedpoll_db::test_utils::TestDatabase;
use sea_orm::{DatabaseConnection, Set};

fn poll_model(id: &str, short_code: &str) -> poll::ActiveModel {
    poll::ActiveModel {
        id: Set(id.to_string()),
        title: Set("Team Standup".to_string()),
        description: Set(None),
        short_code: Set(short_code.to_string()),
        admin_token: Set(format!("token-{id}")),
        created_at: Set(Utc::now().into()),
    }
}

fn option_model(id: &str, poll_id: &str, date: &str, slot: Option<&str>) -> poll_option::ActiveModel {
    poll_option::ActiveModel {
        id: Set(id.to_string()),
        poll_id: Set(poll_id.to_string()),
        date: Set(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
        time_slot: Set(slot.map(String::from)),
    }
}

fn vote_model(
    id: &str,
    poll_id: &str,
    option_id: &str,
    email: &str,
    value: VoteValue,
) -> vote::ActiveModel {
    vote::ActiveModel {
        id: Set(id.to_string()),
        poll_id: Set(poll_id.to_string()),
        option_id: Set(option_id.to_string()),
        voter_name: Set("Alice".to_string()),
        voter_email: Set(email.to_string()),
        vote: Set(value),
        comment: Set(None),
        created_at: Set(Utc::now().into()),
    }
}

async fn setup() -> (Arc<DatabaseConnection>, PollRepository, VoteRepository) {
    let db = TestDatabase::new().await.unwrap();
    let conn = Arc::new(db.into_connection());
    let polls = PollRepository::new(conn.clone());
    let votes = VoteRepository::new(conn.clone(), ChangeFeed::default());
    (conn, polls, votes)
}

#[tokio::test]
async fn test_create_poll_with_options_and_ordering() {
    let (_conn, polls, _votes) = setup().await;

    polls
        .create_with_options(
            poll_model("p1", "CODE2345"),
            vec![
                // Inserted out of order on purpose
                option_model("o3", "p1", "2025-03-02", Some("9:00 AM - 9:30 AM")),
                option_model("o1", "p1", "2025-03-01", None),
                option_model("o2", "p1", "2025-03-01", Some("9:00 AM - 9:30 AM")),
            ],
        )
        .await
        .unwrap();

    let options = polls.find_options("p1").await.unwrap();
    let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
    // Date ascending, then time_slot ascending with NULL first
    assert_eq!(ids, vec!["o1", "o2", "o3"]);
}

#[tokio::test]
async fn test_find_by_short_code() {
    let (_conn, polls, _votes) = setup().await;

    polls
        .create_with_options(poll_model("p1", "CODE2345"), vec![])
        .await
        .unwrap();

    let found = polls.find_by_short_code("CODE2345").await.unwrap();
    assert_eq!(found.map(|p| p.id), Some("p1".to_string()));

    let missing = polls.find_by_short_code("NOPE").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_insert_and_find_response_set() {
    let (_conn, polls, votes) = setup().await;

    polls
        .create_with_options(
            poll_model("p1", "CODEAAAA"),
            vec![
                option_model("o1", "p1", "2025-03-01", None),
                option_model("o2", "p1", "2025-03-02", None),
            ],
        )
        .await
        .unwrap();

    votes
        .insert_set(
            "p1",
            vec![
                vote_model("v1", "p1", "o1", "alice@example.com", VoteValue::Yes),
                vote_model("v2", "p1", "o2", "alice@example.com", VoteValue::Maybe),
            ],
        )
        .await
        .unwrap();

    let set = votes
        .find_by_poll_and_voter("p1", "alice@example.com")
        .await
        .unwrap();
    assert_eq!(set.len(), 2);

    let other = votes
        .find_by_poll_and_voter("p1", "bob@example.com")
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_replace_set_swaps_whole_response() {
    let (_conn, polls, votes) = setup().await;

    polls
        .create_with_options(
            poll_model("p1", "CODEBBBB"),
            vec![
                option_model("o1", "p1", "2025-03-01", None),
                option_model("o2", "p1", "2025-03-02", None),
            ],
        )
        .await
        .unwrap();

    votes
        .insert_set(
            "p1",
            vec![
                vote_model("v1", "p1", "o1", "alice@example.com", VoteValue::Yes),
                vote_model("v2", "p1", "o2", "alice@example.com", VoteValue::Maybe),
            ],
        )
        .await
        .unwrap();

    // Replace with a smaller set: old rows must be fully gone
    votes
        .replace_set_for_voter(
            "p1",
            "alice@example.com",
            vec![vote_model("v3", "p1", "o1", "alice@example.com", VoteValue::Yes)],
        )
        .await
        .unwrap();

    let set = votes
        .find_by_poll_and_voter("p1", "alice@example.com")
        .await
        .unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set[0].id, "v3");
    assert_eq!(set[0].option_id, "o1");
}

#[tokio::test]
async fn test_replace_does_not_touch_other_voters() {
    let (_conn, polls, votes) = setup().await;

    polls
        .create_with_options(
            poll_model("p1", "CODECCCC"),
            vec![option_model("o1", "p1", "2025-03-01", None)],
        )
        .await
        .unwrap();

    votes
        .insert_set(
            "p1",
            vec![vote_model("v1", "p1", "o1", "alice@example.com", VoteValue::Yes)],
        )
        .await
        .unwrap();
    votes
        .insert_set(
            "p1",
            vec![vote_model("v2", "p1", "o1", "bob@example.com", VoteValue::No)],
        )
        .await
        .unwrap();

    votes
        .replace_set_for_voter(
            "p1",
            "alice@example.com",
            vec![vote_model("v3", "p1", "o1", "alice@example.com", VoteValue::Maybe)],
        )
        .await
        .unwrap();

    let bob = votes
        .find_by_poll_and_voter("p1", "bob@example.com")
        .await
        .unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].id, "v2");
}

#[tokio::test]
async fn test_delete_for_voter_is_idempotent() {
    let (_conn, polls, votes) = setup().await;

    polls
        .create_with_options(
            poll_model("p1", "CODEDDDD"),
            vec![option_model("o1", "p1", "2025-03-01", None)],
        )
        .await
        .unwrap();

    votes
        .insert_set(
            "p1",
            vec![vote_model("v1", "p1", "o1", "alice@example.com", VoteValue::Yes)],
        )
        .await
        .unwrap();

    let first = votes.delete_for_voter("p1", "alice@example.com").await.unwrap();
    assert_eq!(first, 1);

    let second = votes.delete_for_voter("p1", "alice@example.com").await.unwrap();
    assert_eq!(second, 0);

    let set = votes
        .find_by_poll_and_voter("p1", "alice@example.com")
        .await
        .unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_mutations_publish_change_events() {
    let (_conn, polls, votes) = setup().await;

    polls
        .create_with_options(
            poll_model("p1", "CODEEEEE"),
            vec![option_model("o1", "p1", "2025-03-01", None)],
        )
        .await
        .unwrap();

    let mut rx = votes.change_feed().subscribe();

    votes
        .insert_set(
            "p1",
            vec![vote_model("v1", "p1", "o1", "alice@example.com", VoteValue::Yes)],
        )
        .await
        .unwrap();
    votes
        .replace_set_for_voter(
            "p1",
            "alice@example.com",
            vec![vote_model("v2", "p1", "o1", "alice@example.com", VoteValue::No)],
        )
        .await
        .unwrap();
    votes.delete_for_voter("p1", "alice@example.com").await.unwrap();

    assert_eq!(rx.recv().await.unwrap().op, ChangeOp::Insert);
    assert_eq!(rx.recv().await.unwrap().op, ChangeOp::Replace);
    let delete = rx.recv().await.unwrap();
    assert_eq!(delete.op, ChangeOp::Delete);
    assert_eq!(delete.poll_id, "p1");
}

#[tokio::test]
async fn test_empty_insert_set_is_rejected() {
    let (_conn, _polls, votes) = setup().await;
    let result = votes.insert_set("p1", vec![]).await;
    assert!(result.is_err());
}
