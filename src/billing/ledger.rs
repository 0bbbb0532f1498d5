use crate::domain::billing_log::NewBillingLogEntry;
use crate::gateways::ChargeOutcome;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Append-only sink for charge attempts. No reads, no updates.
pub trait BillingLedger {
    fn record(&mut self, subscription_id: Uuid, amount: Decimal, outcome: &ChargeOutcome);
}

/// Entries produced by one cycle, held until they are committed together with the
/// subscription's new state.
#[derive(Debug, Default)]
pub struct CycleLedger {
    entries: Vec<NewBillingLogEntry>,
}

impl CycleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[NewBillingLogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<NewBillingLogEntry> {
        self.entries
    }
}

impl BillingLedger for CycleLedger {
    fn record(&mut self, subscription_id: Uuid, amount: Decimal, outcome: &ChargeOutcome) {
        self.entries.push(NewBillingLogEntry {
            subscription_id,
            amount,
            status: outcome.as_str().to_string(),
            created_at: chrono::Utc::now(),
        });
    }
}
