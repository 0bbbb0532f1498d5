//! Seeds ten pending subscriptions in memory, rebills each once against the
//! randomized emulated gateway and prints the resulting logs.

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use subscription_rebilling::billing::state_machine::BillingStateMachine;
use subscription_rebilling::config::AppConfig;
use subscription_rebilling::domain::subscription::Subscription;
use subscription_rebilling::gateways::emulated::EmulatedGateway;
use subscription_rebilling::lock::local::LocalCycleLocks;
use subscription_rebilling::repo::memory_store::MemorySubscriptionStore;
use subscription_rebilling::repo::subscription_store::SubscriptionStore;
use subscription_rebilling::service::rebilling_trigger::RebillingTrigger;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let store = MemorySubscriptionStore::new();
    for _ in 0..10 {
        store
            .insert(Subscription::pending(Decimal::new(1000, 0), Utc::now())?)
            .await;
    }

    let trigger = RebillingTrigger {
        store: store.clone(),
        gateway: Arc::new(EmulatedGateway),
        locks: Arc::new(LocalCycleLocks::new()),
        machine: BillingStateMachine::new(cfg.retry_policy.clone(), cfg.balance_deferral()),
    };

    for subscription in store.all().await {
        println!("\nSubscription {} ({}):", subscription.id, subscription.status);

        trigger.on_scheduled_tick(subscription.id).await?;

        for log in store.logs_for(subscription.id).await {
            println!("    - Log #{} ({}): {}", log.id, log.status, log.amount);
        }

        if let Some(current) = store.find(subscription.id).await? {
            println!("  Current status:  {}", current.status);
            if current.has_remaining_balance() {
                println!(
                    "  Remaining balance: {} due {}",
                    current.remaining_balance,
                    current
                        .next_retry_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
    }

    Ok(())
}
