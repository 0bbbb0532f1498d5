use rust_decimal::Decimal;
use uuid::Uuid;

pub mod emulated;
pub mod http_gateway;
pub mod mock;

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub subscription_id: Uuid,
    pub amount: Decimal,
}

/// Normalized result of one charge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Success,
    InsufficientFunds,
    Failed,
    /// Any status the gateway answered with that is not one of the above, kept verbatim.
    Other(String),
    /// No parseable answer: network error, timeout, non-JSON body.
    TransportError(String),
}

impl ChargeOutcome {
    pub fn from_status(status: &str) -> Self {
        match status {
            "success" => ChargeOutcome::Success,
            "insufficient_funds" => ChargeOutcome::InsufficientFunds,
            "failed" => ChargeOutcome::Failed,
            other => ChargeOutcome::Other(other.to_string()),
        }
    }

    /// Status string written to the billing log.
    pub fn as_str(&self) -> &str {
        match self {
            ChargeOutcome::Success => "success",
            ChargeOutcome::InsufficientFunds => "insufficient_funds",
            ChargeOutcome::Failed => "failed",
            ChargeOutcome::Other(status) => status,
            ChargeOutcome::TransportError(_) => "transport_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ChargeOutcome::Success)
    }
}

/// One outbound charge per call. Implementations never retry and never fail:
/// transport problems come back as [`ChargeOutcome::TransportError`].
#[async_trait::async_trait]
pub trait BillingGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn charge(&self, request: ChargeRequest) -> ChargeOutcome;
}
