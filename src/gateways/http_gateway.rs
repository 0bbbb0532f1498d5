use crate::domain::payment_intent::PaymentIntentResponse;
use crate::gateways::{BillingGateway, ChargeOutcome, ChargeRequest};

/// Gateway reached over HTTP: form-encoded `amount` + `subscription_id`,
/// JSON `{ "status": ... }` back.
pub struct HttpGateway {
    pub url: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl BillingGateway for HttpGateway {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn charge(&self, request: ChargeRequest) -> ChargeOutcome {
        let form = [
            ("amount", request.amount.to_string()),
            ("subscription_id", request.subscription_id.to_string()),
        ];

        let resp = self
            .client
            .post(&self.url)
            .form(&form)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await;

        let outcome = match resp {
            Ok(r) => {
                let http_status = r.status();
                match r.json::<PaymentIntentResponse>().await {
                    Ok(body) => ChargeOutcome::from_status(&body.status),
                    Err(e) => ChargeOutcome::TransportError(format!(
                        "unparseable gateway response (HTTP {}): {}",
                        http_status.as_u16(),
                        e
                    )),
                }
            }
            Err(e) if e.is_timeout() => ChargeOutcome::TransportError("gateway timeout".to_string()),
            Err(e) => ChargeOutcome::TransportError(e.to_string()),
        };

        if let ChargeOutcome::TransportError(reason) = &outcome {
            tracing::warn!(
                subscription_id = %request.subscription_id,
                amount = %request.amount,
                "gateway call failed: {}",
                reason
            );
        }

        outcome
    }
}
