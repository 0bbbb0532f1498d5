use serde::{Deserialize, Serialize};

/// Form body posted to the gateway, and accepted by the emulated gateway endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentIntentForm {
    pub amount: String,
    pub subscription_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentIntentResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}
