use crate::http::handlers::{ops, payment_intents, subscriptions};
use crate::http::middleware::admin_auth::require_internal_api_key;
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

pub fn build(state: AppState, admin_key: String) -> Router {
    let admin_routes = Router::new()
        .route("/admin/subscriptions/:subscription_id/rebill", post(subscriptions::rebill))
        .layer(from_fn_with_state(admin_key, require_internal_api_key));

    Router::new()
        .route("/health", get(ops::health))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .route("/paymentIntents/create", post(payment_intents::create_payment_intent))
        .route("/subscriptions/:subscription_id", get(subscriptions::get_subscription))
        .route("/subscriptions/:subscription_id/logs", get(subscriptions::list_logs))
        .merge(admin_routes)
        .with_state(state)
}
