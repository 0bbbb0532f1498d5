use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Pending,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "pending" => Ok(SubscriptionStatus::Pending),
            other => anyhow::bail!("unknown subscription status: {other}"),
        }
    }
}

/// A recurring charge and where it stands in the current billing cycle.
///
/// Transitions consume the value and hand back the next one; nothing here touches
/// storage or the clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub status: SubscriptionStatus,
    pub amount: Decimal,
    pub retry_attempts: i32,
    pub remaining_balance: Decimal,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// A fresh subscription awaiting its first charge at `first_charge_at`.
    pub fn pending(amount: Decimal, first_charge_at: DateTime<Utc>) -> anyhow::Result<Self> {
        anyhow::ensure!(amount > Decimal::ZERO, "subscription amount must be > 0, got {amount}");
        anyhow::ensure!(amount.scale() <= 2, "subscription amount must be whole cents, got {amount}");
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            status: SubscriptionStatus::Pending,
            amount,
            retry_attempts: 0,
            remaining_balance: Decimal::ZERO,
            next_retry_at: Some(first_charge_at),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is(&self, status: SubscriptionStatus) -> bool {
        self.status == status
    }

    pub fn has_remaining_balance(&self) -> bool {
        self.remaining_balance > Decimal::ZERO
    }

    /// Eligible for a rebilling cycle: pending and the retry time has been reached.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is(SubscriptionStatus::Pending) && self.next_retry_at.is_some_and(|at| at <= now)
    }

    pub fn activate(self) -> Self {
        Self {
            status: SubscriptionStatus::Active,
            retry_attempts: 0,
            remaining_balance: Decimal::ZERO,
            next_retry_at: None,
            ..self
        }
    }

    pub fn deactivate(self) -> Self {
        Self {
            status: SubscriptionStatus::Inactive,
            next_retry_at: None,
            ..self
        }
    }

    /// Defers `balance` to a single follow-up charge at `retry_at`.
    pub fn schedule_retry(self, balance: Decimal, retry_at: DateTime<Utc>) -> Self {
        Self {
            status: SubscriptionStatus::Pending,
            retry_attempts: 0,
            remaining_balance: balance,
            next_retry_at: Some(retry_at),
            ..self
        }
    }

    pub fn with_retry_attempts(self, retry_attempts: i32) -> Self {
        Self {
            retry_attempts,
            ..self
        }
    }
}
