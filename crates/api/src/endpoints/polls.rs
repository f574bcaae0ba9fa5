//! Poll endpoints: creation, voting view, returning-voter lookup.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use schedpoll_common::AppResult;
use schedpoll_core::{CreatePollInput, NewPollOption};
use schedpoll_db::entities::VoteValue;
use serde::{Deserialize, Serialize};

use crate::{response::ApiResponse, state::AppState};

/// Create poll request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<OptionRequest>,
}

/// One candidate slot in a create request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub time_slot: Option<String>,
}

/// Create poll response. The admin token appears here and nowhere
/// else.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollResponse {
    pub poll_id: String,
    pub admin_token: String,
    pub short_code: String,
}

/// Poll as shown to voters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub short_code: String,
    pub options: Vec<OptionResponse>,
}

/// One option in the voting view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResponse {
    pub id: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
}

/// A returning voter's stored response set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voter_name: Option<String>,
    pub responses: Vec<ExistingVote>,
}

/// One stored answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingVote {
    pub option_id: String,
    pub vote: VoteValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Create a poll.
async fn create_poll(
    State(state): State<AppState>,
    Json(req): Json<CreatePollRequest>,
) -> AppResult<ApiResponse<CreatePollResponse>> {
    let created = state
        .poll_service
        .create_poll(CreatePollInput {
            title: req.title,
            description: req.description,
            options: req
                .options
                .into_iter()
                .map(|o| NewPollOption {
                    date: o.date,
                    time_slot: o.time_slot,
                })
                .collect(),
        })
        .await?;

    Ok(ApiResponse::ok(CreatePollResponse {
        poll_id: created.poll_id,
        admin_token: created.admin_token,
        short_code: created.short_code,
    }))
}

/// Fetch a poll for voting by id or short code. No secrets.
async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> AppResult<ApiResponse<PollResponse>> {
    let view = state.poll_service.get_poll_for_voting(&poll_id).await?;

    Ok(ApiResponse::ok(PollResponse {
        id: view.id,
        title: view.title,
        description: view.description,
        short_code: view.short_code,
        options: view
            .options
            .into_iter()
            .map(|o| OptionResponse {
                id: o.id,
                date: o.date,
                time_slot: o.time_slot,
            })
            .collect(),
    }))
}

/// Look up a voter's existing response set, so the UI can offer
/// edit/delete instead of a second independent response.
async fn find_existing_response(
    State(state): State<AppState>,
    Path((poll_id, email)): Path<(String, String)>,
) -> AppResult<ApiResponse<ExistingResponse>> {
    let rows = state.resolver.resolve(&poll_id, &email).await?;

    Ok(ApiResponse::ok(ExistingResponse {
        voter_name: rows.first().map(|v| v.voter_name.clone()),
        responses: rows
            .into_iter()
            .map(|v| ExistingVote {
                option_id: v.option_id,
                vote: v.vote,
                comment: v.comment,
            })
            .collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_poll))
        .route("/{poll_id}", get(get_poll))
        .route("/{poll_id}/responses/{email}", get(find_existing_response))
}
