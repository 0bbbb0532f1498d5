use crate::gateways::{BillingGateway, ChargeOutcome, ChargeRequest};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays a fixed script of outcomes and remembers every request it saw.
///
/// Once the script runs dry every further charge answers with `fallback`.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<ChargeOutcome>>,
    fallback: ChargeOutcome,
    requests: Mutex<Vec<ChargeRequest>>,
}

impl ScriptedGateway {
    pub fn new(script: impl IntoIterator<Item = ChargeOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: ChargeOutcome::TransportError("script exhausted".to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(outcome: ChargeOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChargeRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl BillingGateway for ScriptedGateway {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn charge(&self, request: ChargeRequest) -> ChargeOutcome {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }

        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}
