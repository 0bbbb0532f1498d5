use crate::repo::subscription_store::SubscriptionStore;
use crate::service::rebilling_trigger::{RebillingTrigger, TickOutcome};
use anyhow::Result;
use chrono::Utc;
use tokio::task::JoinSet;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub due: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Periodically fires the rebilling trigger for every due subscription.
pub struct RebillingScheduler<S> {
    pub trigger: RebillingTrigger<S>,
    pub interval: std::time::Duration,
    pub batch_size: i64,
}

impl<S> RebillingScheduler<S>
where
    S: SubscriptionStore + Clone + 'static,
{
    pub async fn run(self) {
        loop {
            match self.tick().await {
                Ok(summary) if summary.due > 0 => {
                    tracing::info!(
                        due = summary.due,
                        completed = summary.completed,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "rebilling tick finished"
                    );
                }
                Ok(_) => {}
                Err(err) => tracing::error!("rebilling scheduler error: {}", err),
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One pass: each due subscription gets its own task; a failing cycle does not stop
    /// the others and is picked up again on the next pass.
    pub async fn tick(&self) -> Result<TickSummary> {
        let due = self.trigger.store.due_ids(Utc::now(), self.batch_size).await?;
        let mut summary = TickSummary {
            due: due.len(),
            ..TickSummary::default()
        };

        let mut tasks = JoinSet::new();
        for subscription_id in due {
            let trigger = self.trigger.clone();
            tasks.spawn(async move { (subscription_id, trigger.on_scheduled_tick(subscription_id).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(TickOutcome::Completed { .. }))) => summary.completed += 1,
                Ok((_, Ok(TickOutcome::Skipped(_)))) => summary.skipped += 1,
                Ok((subscription_id, Err(e))) => {
                    summary.failed += 1;
                    tracing::error!(%subscription_id, "billing cycle failed: {}", e);
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("billing cycle task aborted: {}", e);
                }
            }
        }

        Ok(summary)
    }
}
