use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    repository::UserRepository,
};

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RemainingQuery {
    pub email: String,
}

pub async fn send(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<Value>> {
    if req.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    state.service_context.otp_service.issue(&req.email).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Verification code sent",
    })))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<Value>> {
    let outcome = state
        .service_context
        .otp_service
        .verify(&req.email, &req.code)
        .await?;

    if outcome.is_verified() {
        // Best effort: the email may belong to a not-yet-registered user.
        state
            .service_context
            .user_repo
            .mark_email_verified(&req.email)
            .await?;
    }

    Ok(Json(json!({
        "success": outcome.is_verified(),
        "message": outcome.message(),
    })))
}

pub async fn remaining(
    State(state): State<AppState>,
    Query(query): Query<RemainingQuery>,
) -> Result<Json<Value>> {
    let remaining = state
        .service_context
        .otp_service
        .remaining_seconds(&query.email)
        .await?;

    match remaining {
        Some(seconds) => Ok(Json(json!({
            "success": true,
            "message": "Code is outstanding",
            "remaining_seconds": seconds,
        }))),
        None => Ok(Json(json!({
            "success": false,
            "message": "No verification code found for this email",
        }))),
    }
}
