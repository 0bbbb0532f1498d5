use crate::billing::ledger::BillingLedger;
use crate::billing::retry_policy::RetryPolicy;
use crate::domain::subscription::Subscription;
use crate::gateways::{BillingGateway, ChargeOutcome, ChargeRequest};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum LadderStep {
    /// Charge again at the next rung within the same cycle.
    Retry(Subscription),
    Settled(Subscription),
}

/// Outcome of collecting a previously deferred balance. That charge is never retried.
pub fn apply_balance_outcome(subscription: Subscription, outcome: &ChargeOutcome) -> Subscription {
    if outcome.is_success() {
        subscription.activate()
    } else {
        subscription.deactivate()
    }
}

/// Outcome of a ladder charge of `charged` at rung `subscription.retry_attempts`.
pub fn apply_ladder_outcome(
    subscription: Subscription,
    policy: &RetryPolicy,
    charged: Decimal,
    outcome: &ChargeOutcome,
    balance_due_at: DateTime<Utc>,
) -> LadderStep {
    match outcome {
        ChargeOutcome::Success => {
            let leftover = subscription.amount - charged;
            if leftover > Decimal::ZERO {
                LadderStep::Settled(subscription.schedule_retry(leftover, balance_due_at))
            } else {
                LadderStep::Settled(subscription.activate())
            }
        }
        ChargeOutcome::InsufficientFunds if subscription.retry_attempts < policy.last_attempt() => {
            let next = subscription.retry_attempts + 1;
            LadderStep::Retry(subscription.with_retry_attempts(next))
        }
        _ => LadderStep::Settled(subscription.deactivate()),
    }
}

#[derive(Debug, Clone)]
pub struct BillingStateMachine {
    pub policy: RetryPolicy,
    /// How long a balance left over by a reduced successful charge is deferred.
    pub balance_deferral: Duration,
}

impl Default for BillingStateMachine {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            balance_deferral: Duration::days(7),
        }
    }
}

impl BillingStateMachine {
    pub fn new(policy: RetryPolicy, balance_deferral: Duration) -> Self {
        Self {
            policy,
            balance_deferral,
        }
    }

    /// Runs one billing cycle to its terminal or paused state and returns the new
    /// subscription. Every charge is recorded in `ledger` before its transition applies.
    pub async fn run_cycle<G, L>(
        &self,
        subscription: Subscription,
        gateway: &G,
        ledger: &mut L,
        now: DateTime<Utc>,
    ) -> Subscription
    where
        G: BillingGateway + ?Sized,
        L: BillingLedger,
    {
        if subscription.has_remaining_balance() {
            let amount = subscription.remaining_balance;
            let outcome = charge(gateway, &subscription, amount).await;
            ledger.record(subscription.id, amount, &outcome);
            return apply_balance_outcome(subscription, &outcome);
        }

        let balance_due_at = now + self.balance_deferral;
        let mut current = subscription;
        for attempt in current.retry_attempts..=self.policy.last_attempt() {
            let Some(amount) = self.policy.amount_for_attempt(current.amount, attempt) else {
                break;
            };
            let outcome = charge(gateway, &current, amount).await;
            ledger.record(current.id, amount, &outcome);

            match apply_ladder_outcome(current, &self.policy, amount, &outcome, balance_due_at) {
                LadderStep::Retry(next) => current = next,
                LadderStep::Settled(next) => return next,
            }
        }

        tracing::warn!(
            subscription_id = %current.id,
            retry_attempts = current.retry_attempts,
            "no chargeable rung left, deactivating without charge"
        );
        current.deactivate()
    }
}

async fn charge<G>(gateway: &G, subscription: &Subscription, amount: Decimal) -> ChargeOutcome
where
    G: BillingGateway + ?Sized,
{
    let outcome = gateway
        .charge(ChargeRequest {
            subscription_id: subscription.id,
            amount,
        })
        .await;
    tracing::debug!(
        subscription_id = %subscription.id,
        attempt = subscription.retry_attempts,
        %amount,
        status = outcome.as_str(),
        gateway = gateway.name(),
        "charge attempted"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::SubscriptionStatus;
    use rust_decimal_macros::dec;

    fn sub(retry_attempts: i32) -> Subscription {
        Subscription::pending(dec!(1000), Utc::now())
            .unwrap()
            .with_retry_attempts(retry_attempts)
    }

    #[test]
    fn reduced_success_defers_the_leftover() {
        let due = Utc::now() + Duration::days(7);
        let step = apply_ladder_outcome(
            sub(2),
            &RetryPolicy::default(),
            dec!(500),
            &ChargeOutcome::Success,
            due,
        );
        let next = match step {
            LadderStep::Settled(next) => next,
            other => panic!("expected settled, got {other:?}"),
        };
        assert!(next.is(SubscriptionStatus::Pending));
        assert_eq!(next.remaining_balance, dec!(500));
        assert_eq!(next.retry_attempts, 0);
        assert_eq!(next.next_retry_at, Some(due));
    }

    #[test]
    fn insufficient_funds_moves_down_the_ladder_until_the_last_rung() {
        let policy = RetryPolicy::default();
        let step = apply_ladder_outcome(
            sub(0),
            &policy,
            dec!(1000),
            &ChargeOutcome::InsufficientFunds,
            Utc::now(),
        );
        assert!(matches!(step, LadderStep::Retry(ref s) if s.retry_attempts == 1));

        let step = apply_ladder_outcome(
            sub(3),
            &policy,
            dec!(250),
            &ChargeOutcome::InsufficientFunds,
            Utc::now(),
        );
        assert!(
            matches!(step, LadderStep::Settled(ref s) if s.is(SubscriptionStatus::Inactive) && s.retry_attempts == 3)
        );
    }

    #[test]
    fn non_retryable_outcomes_deactivate() {
        for outcome in [
            ChargeOutcome::Failed,
            ChargeOutcome::Other("error".to_string()),
            ChargeOutcome::TransportError("reset".to_string()),
        ] {
            let step =
                apply_ladder_outcome(sub(0), &RetryPolicy::default(), dec!(1000), &outcome, Utc::now());
            assert!(matches!(step, LadderStep::Settled(ref s) if s.is(SubscriptionStatus::Inactive)));
        }
    }

    #[test]
    fn balance_collection_is_single_shot() {
        let owing = sub(0).schedule_retry(dec!(500), Utc::now());
        let paid = apply_balance_outcome(owing.clone(), &ChargeOutcome::Success);
        assert!(paid.is(SubscriptionStatus::Active));
        assert_eq!(paid.remaining_balance, Decimal::ZERO);

        let lost = apply_balance_outcome(owing, &ChargeOutcome::InsufficientFunds);
        assert!(lost.is(SubscriptionStatus::Inactive));
    }
}
