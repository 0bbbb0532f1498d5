use crate::domain::billing_log::NewBillingLogEntry;
use crate::domain::subscription::Subscription;
use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Where subscriptions live between cycles.
#[async_trait::async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Subscription>>;

    /// Persists the subscription's post-cycle state and appends the cycle's ledger
    /// entries as a single unit: either all of it lands or none of it does.
    async fn commit_cycle(&self, subscription: &Subscription, entries: &[NewBillingLogEntry]) -> Result<()>;

    /// Pending subscriptions whose retry time has been reached, oldest first.
    async fn due_ids(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Uuid>>;
}
