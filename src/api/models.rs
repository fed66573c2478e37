//! Request and response bodies of the subscription API.

use serde::{Deserialize, Serialize};

/// Uniform error envelope: `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Form body of `POST /subscriptions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeForm {
    pub url: Option<String>,
}
