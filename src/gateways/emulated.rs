use crate::gateways::{BillingGateway, ChargeOutcome, ChargeRequest};
use rand::seq::SliceRandom;
use rand::Rng;

/// What the emulated card network decided for one charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatedDecision {
    pub approved: bool,
    pub error_code: Option<&'static str>,
}

const DECISIONS: [EmulatedDecision; 3] = [
    EmulatedDecision {
        approved: true,
        error_code: None,
    },
    EmulatedDecision {
        approved: false,
        error_code: Some("insufficient_funds"),
    },
    EmulatedDecision {
        approved: false,
        error_code: Some("other_error"),
    },
];

pub fn sample_decision<R: Rng + ?Sized>(rng: &mut R) -> EmulatedDecision {
    *DECISIONS.choose(rng).unwrap_or(&DECISIONS[0])
}

/// Wire status the emulated endpoint answers with.
pub fn response_status(decision: &EmulatedDecision) -> &'static str {
    if decision.approved {
        "success"
    } else if decision.error_code == Some("insufficient_funds") {
        "insufficient_funds"
    } else {
        "failed"
    }
}

/// In-process stand-in for the emulated endpoint; outcomes are random.
pub struct EmulatedGateway;

#[async_trait::async_trait]
impl BillingGateway for EmulatedGateway {
    fn name(&self) -> &'static str {
        "emulated"
    }

    async fn charge(&self, request: ChargeRequest) -> ChargeOutcome {
        let decision = {
            let mut rng = rand::thread_rng();
            sample_decision(&mut rng)
        };
        tracing::debug!(
            subscription_id = %request.subscription_id,
            amount = %request.amount,
            ?decision,
            "emulated charge"
        );
        ChargeOutcome::from_status(response_status(&decision))
    }
}
