use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{ActorContext, GatewayResponse, InitializePaymentRequest},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub gym_id: i64,
    #[serde(flatten)]
    pub gateway: GatewayResponse,
}

#[derive(Debug, Deserialize)]
pub struct CancelPaymentRequest {
    pub gym_id: i64,
    pub reason: String,
}

pub async fn initialize(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<InitializePaymentRequest>,
) -> Result<Json<Value>> {
    let actor = ActorContext::new(current.user.id, req.gym_id);

    let payment_id = state
        .service_context
        .payment_service
        .initialize(
            &actor,
            req.amount_cents,
            req.base_amount_cents,
            req.payment_type,
            req.related_id,
        )
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Payment initialized",
        "payment_id": payment_id,
    })))
}

pub async fn process(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<Value>> {
    let actor = ActorContext::new(current.user.id, req.gym_id);

    let payment = state
        .service_context
        .payment_service
        .process(&actor, id, req.gateway)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Payment completed",
        "payment": payment,
    })))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<CancelPaymentRequest>,
) -> Result<Json<Value>> {
    let actor = ActorContext::new(current.user.id, req.gym_id);

    let payment = state
        .service_context
        .payment_service
        .cancel(&actor, id, &req.reason)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Payment cancelled",
        "payment": payment,
    })))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let payment = state
        .service_context
        .payment_service
        .find_for_user(current.user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "payment": payment,
    })))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Value>> {
    let payments = state
        .service_context
        .payment_service
        .list_for_user(current.user.id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "payments": payments,
    })))
}
