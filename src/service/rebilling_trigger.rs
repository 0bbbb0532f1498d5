use crate::billing::ledger::CycleLedger;
use crate::billing::state_machine::BillingStateMachine;
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::gateways::BillingGateway;
use crate::lock::CycleLocks;
use crate::repo::subscription_store::SubscriptionStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    /// Another cycle for the same subscription is running.
    Locked,
    NotPending(SubscriptionStatus),
    NotDue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Completed {
        status: SubscriptionStatus,
        attempts: usize,
    },
}

/// Entry point for scheduled rebilling of a single subscription.
pub struct RebillingTrigger<S> {
    pub store: S,
    pub gateway: Arc<dyn BillingGateway>,
    pub locks: Arc<dyn CycleLocks>,
    pub machine: BillingStateMachine,
}

impl<S: Clone> Clone for RebillingTrigger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
            locks: self.locks.clone(),
            machine: self.machine.clone(),
        }
    }
}

impl<S: SubscriptionStore> RebillingTrigger<S> {
    pub async fn on_scheduled_tick(&self, subscription_id: Uuid) -> Result<TickOutcome> {
        self.on_tick_at(subscription_id, Utc::now()).await
    }

    /// Same as [`Self::on_scheduled_tick`] with an explicit clock reading.
    pub async fn on_tick_at(&self, subscription_id: Uuid, now: DateTime<Utc>) -> Result<TickOutcome> {
        let Some(lease) = self.locks.try_acquire(subscription_id).await? else {
            tracing::debug!(%subscription_id, "cycle already running, skipping tick");
            return Ok(TickOutcome::Skipped(SkipReason::Locked));
        };

        let result = self.run_locked(subscription_id, now).await;

        if let Err(e) = self.locks.release(lease).await {
            tracing::warn!(%subscription_id, "failed to release cycle lock: {}", e);
        }

        result
    }

    async fn run_locked(&self, subscription_id: Uuid, now: DateTime<Utc>) -> Result<TickOutcome> {
        let Some(subscription) = self.store.find(subscription_id).await? else {
            tracing::warn!(%subscription_id, "subscription not found, skipping tick");
            return Ok(TickOutcome::Skipped(SkipReason::NotFound));
        };

        if let Some(reason) = ineligibility(&subscription, now) {
            tracing::debug!(%subscription_id, ?reason, "subscription not eligible for rebilling");
            return Ok(TickOutcome::Skipped(reason));
        }

        let mut ledger = CycleLedger::new();
        let next = self
            .machine
            .run_cycle(subscription, self.gateway.as_ref(), &mut ledger, now)
            .await;

        self.store.commit_cycle(&next, ledger.entries()).await?;

        tracing::info!(
            %subscription_id,
            status = %next.status,
            attempts = ledger.entries().len(),
            remaining_balance = %next.remaining_balance,
            "billing cycle committed"
        );

        Ok(TickOutcome::Completed {
            status: next.status,
            attempts: ledger.entries().len(),
        })
    }
}

fn ineligibility(subscription: &Subscription, now: DateTime<Utc>) -> Option<SkipReason> {
    if !subscription.is(SubscriptionStatus::Pending) {
        Some(SkipReason::NotPending(subscription.status))
    } else if !subscription.is_due(now) {
        Some(SkipReason::NotDue)
    } else {
        None
    }
}
