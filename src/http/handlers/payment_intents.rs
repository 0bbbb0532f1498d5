use crate::domain::payment_intent::{err, PaymentIntentForm, PaymentIntentResponse};
use crate::gateways::emulated::{response_status, sample_decision};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Form, Json};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Emulated card gateway: the default `GATEWAY_URL` points here.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Form(form): Form<PaymentIntentForm>,
) -> impl IntoResponse {
    let Ok(subscription_id) = form.subscription_id.parse::<Uuid>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(err("INVALID_SUBSCRIPTION_ID", "subscription_id must be a UUID")),
        )
            .into_response();
    };
    let Ok(amount) = form.amount.parse::<Decimal>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(err("INVALID_AMOUNT", "amount must be a decimal number")),
        )
            .into_response();
    };

    match state.subscriptions_repo.get(subscription_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(err("SUBSCRIPTION_NOT_FOUND", "no subscription with that id")),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(err("INTERNAL_ERROR", &e.to_string())),
            )
                .into_response()
        }
    }

    let decision = {
        let mut rng = rand::thread_rng();
        sample_decision(&mut rng)
    };
    let status = response_status(&decision);
    tracing::info!(%subscription_id, %amount, status, "emulated payment intent");

    (
        StatusCode::OK,
        Json(PaymentIntentResponse {
            status: status.to_string(),
        }),
    )
        .into_response()
}
