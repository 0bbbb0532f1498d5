use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use subscription_rebilling::billing::state_machine::BillingStateMachine;
use subscription_rebilling::config::AppConfig;
use subscription_rebilling::gateways::http_gateway::HttpGateway;
use subscription_rebilling::lock::store_redis::RedisCycleLocks;
use subscription_rebilling::repo::subscription_logs_repo::SubscriptionLogsRepo;
use subscription_rebilling::repo::subscriptions_repo::SubscriptionsRepo;
use subscription_rebilling::service::rebilling_scheduler::RebillingScheduler;
use subscription_rebilling::service::rebilling_trigger::RebillingTrigger;
use subscription_rebilling::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;

    let subscriptions_repo = SubscriptionsRepo { pool: pool.clone() };
    let subscription_logs_repo = SubscriptionLogsRepo { pool: pool.clone() };

    let trigger = RebillingTrigger {
        store: subscriptions_repo.clone(),
        gateway: Arc::new(HttpGateway::new(cfg.gateway_url.clone(), cfg.gateway_timeout_ms)),
        locks: Arc::new(RedisCycleLocks::new(redis_client.clone(), cfg.cycle_lock_ttl_ms)),
        machine: BillingStateMachine::new(cfg.retry_policy.clone(), cfg.balance_deferral()),
    };

    let scheduler = RebillingScheduler {
        trigger: trigger.clone(),
        interval: std::time::Duration::from_secs(cfg.rebill_interval_secs),
        batch_size: cfg.rebill_batch_size,
    };
    tokio::spawn(scheduler.run());

    let state = AppState {
        subscriptions_repo,
        subscription_logs_repo,
        trigger,
        redis_client,
    };

    let app = subscription_rebilling::http::router::build(state, cfg.internal_api_key.clone());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
