use crate::domain::billing_log::{BillingLogRow, NewBillingLogEntry};
use crate::domain::subscription::Subscription;
use crate::repo::subscription_store::SubscriptionStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    subscriptions: HashMap<Uuid, Subscription>,
    logs: Vec<BillingLogRow>,
    next_log_id: i64,
}

/// Subscription store kept in process memory. Used by the demo binary and tests.
#[derive(Clone, Default)]
pub struct MemorySubscriptionStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, subscription: Subscription) {
        let mut tables = self.inner.write().await;
        tables.subscriptions.insert(subscription.id, subscription);
    }

    pub async fn all(&self) -> Vec<Subscription> {
        let tables = self.inner.read().await;
        let mut all: Vec<_> = tables.subscriptions.values().cloned().collect();
        all.sort_by_key(|s| s.created_at);
        all
    }

    /// Ledger rows for one subscription in creation order.
    pub async fn logs_for(&self, subscription_id: Uuid) -> Vec<BillingLogRow> {
        let tables = self.inner.read().await;
        tables
            .logs
            .iter()
            .filter(|l| l.subscription_id == subscription_id)
            .cloned()
            .collect()
    }

    /// Drops the subscription together with its ledger rows.
    pub async fn delete(&self, subscription_id: Uuid) -> bool {
        let mut tables = self.inner.write().await;
        tables.logs.retain(|l| l.subscription_id != subscription_id);
        tables.subscriptions.remove(&subscription_id).is_some()
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn find(&self, id: Uuid) -> Result<Option<Subscription>> {
        let tables = self.inner.read().await;
        Ok(tables.subscriptions.get(&id).cloned())
    }

    async fn commit_cycle(&self, subscription: &Subscription, entries: &[NewBillingLogEntry]) -> Result<()> {
        let mut tables = self.inner.write().await;
        anyhow::ensure!(
            tables.subscriptions.contains_key(&subscription.id),
            "subscription {} not found",
            subscription.id
        );

        for entry in entries {
            tables.next_log_id += 1;
            let id = tables.next_log_id;
            tables.logs.push(BillingLogRow {
                id,
                subscription_id: entry.subscription_id,
                amount: entry.amount,
                status: entry.status.clone(),
                created_at: entry.created_at,
            });
        }

        let mut saved = subscription.clone();
        saved.updated_at = Utc::now();
        tables.subscriptions.insert(saved.id, saved);
        Ok(())
    }

    async fn due_ids(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Uuid>> {
        let tables = self.inner.read().await;
        let mut due: Vec<_> = tables
            .subscriptions
            .values()
            .filter(|s| s.is_due(now))
            .collect();
        due.sort_by_key(|s| s.next_retry_at);
        Ok(due
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|s| s.id)
            .collect())
    }
}
