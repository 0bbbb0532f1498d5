use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use subscription_rebilling::billing::state_machine::BillingStateMachine;
use subscription_rebilling::config::AppConfig;
use subscription_rebilling::gateways::http_gateway::HttpGateway;
use subscription_rebilling::lock::store_redis::RedisCycleLocks;
use subscription_rebilling::repo::subscriptions_repo::SubscriptionsRepo;
use subscription_rebilling::service::rebilling_scheduler::RebillingScheduler;
use subscription_rebilling::service::rebilling_trigger::RebillingTrigger;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;

    let scheduler = RebillingScheduler {
        trigger: RebillingTrigger {
            store: SubscriptionsRepo { pool },
            gateway: Arc::new(HttpGateway::new(cfg.gateway_url.clone(), cfg.gateway_timeout_ms)),
            locks: Arc::new(RedisCycleLocks::new(redis_client, cfg.cycle_lock_ttl_ms)),
            machine: BillingStateMachine::new(cfg.retry_policy.clone(), cfg.balance_deferral()),
        },
        interval: std::time::Duration::from_secs(cfg.rebill_interval_secs),
        batch_size: cfg.rebill_batch_size,
    };

    tracing::info!(
        gateway = %cfg.gateway_url,
        interval_secs = cfg.rebill_interval_secs,
        "rebilling worker started"
    );
    scheduler.run().await;
    Ok(())
}
