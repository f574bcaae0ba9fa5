//! Vote endpoints: submit, resubmit, withdraw.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use schedpoll_common::AppResult;
use schedpoll_core::ResponseEntry;
use serde::{Deserialize, Serialize};

use crate::{response::ApiResponse, state::AppState};

/// First-time submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    pub name: String,
    pub email: String,
    /// Option id -> answer. Unanswered options are simply absent.
    pub responses: HashMap<String, ResponseEntry>,
}

/// Wholesale replacement of an existing response set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResubmitVoteRequest {
    pub email: String,
    pub responses: HashMap<String, ResponseEntry>,
}

/// Acknowledgement payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAck {
    pub ok: bool,
}

/// Submit a first-time response set.
async fn submit_vote(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Json(req): Json<SubmitVoteRequest>,
) -> AppResult<ApiResponse<VoteAck>> {
    state
        .vote_service
        .submit(&poll_id, &req.name, &req.email, req.responses)
        .await?;
    Ok(ApiResponse::ok(VoteAck { ok: true }))
}

/// Replace an existing response set.
async fn resubmit_vote(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Json(req): Json<ResubmitVoteRequest>,
) -> AppResult<ApiResponse<VoteAck>> {
    state
        .vote_service
        .resubmit(&poll_id, &req.email, req.responses)
        .await?;
    Ok(ApiResponse::ok(VoteAck { ok: true }))
}

/// Withdraw a voter's response set. Idempotent.
async fn withdraw_vote(
    State(state): State<AppState>,
    Path((poll_id, email)): Path<(String, String)>,
) -> AppResult<ApiResponse<VoteAck>> {
    state.vote_service.withdraw(&poll_id, &email).await?;
    Ok(ApiResponse::ok(VoteAck { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{poll_id}/votes", post(submit_vote).put(resubmit_vote))
        .route("/{poll_id}/votes/{email}", delete(withdraw_vote))
}
