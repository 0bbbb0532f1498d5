use crate::domain::payment_intent::err;
use crate::service::rebilling_trigger::TickOutcome;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.subscriptions_repo.get(subscription_id).await {
        Ok(Some(sub)) => (StatusCode::OK, Json(sub)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(err("SUBSCRIPTION_NOT_FOUND", "no subscription with that id")),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(err("INTERNAL_ERROR", &e.to_string())),
        )
            .into_response(),
    }
}

pub async fn list_logs(
    State(state): State<AppState>,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse {
    let logs = match state
        .subscription_logs_repo
        .list_by_subscription_id(subscription_id)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(err("INTERNAL_ERROR", &e.to_string())),
            )
                .into_response()
        }
    };

    let collected: rust_decimal::Decimal = logs
        .iter()
        .filter(|l| l.status == "success")
        .map(|l| l.amount)
        .sum();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "subscription_id": subscription_id,
            "total_attempts": logs.len(),
            "collected": collected,
            "logs": logs
        })),
    )
        .into_response()
}

/// Manual rebill, subject to the same eligibility rules as the scheduler.
pub async fn rebill(
    State(state): State<AppState>,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.trigger.on_scheduled_tick(subscription_id).await {
        Ok(TickOutcome::Completed { status, attempts }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "subscription_id": subscription_id,
                "outcome": "completed",
                "status": status,
                "attempts": attempts
            })),
        )
            .into_response(),
        Ok(TickOutcome::Skipped(reason)) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "subscription_id": subscription_id,
                "outcome": "skipped",
                "reason": format!("{:?}", reason)
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(err("CYCLE_FAILED", &e.to_string())),
        )
            .into_response(),
    }
}
