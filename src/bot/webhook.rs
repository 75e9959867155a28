//! Webhook Delivery
//!
//! POSTs messages to the chat webhook and checks its response envelope.

use serde::Deserialize;
use tracing::debug;

use crate::bot::TextMessage;
use crate::error::{NotifierError, Result};

// == Hook Response ==
/// Response envelope returned by the webhook for every post.
#[derive(Debug, Deserialize)]
pub struct HookResponse {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
}

// == Webhook Bot ==
/// Sends notifications to a single chat webhook over a shared HTTP client.
#[derive(Debug, Clone)]
pub struct WebhookBot {
    webhook: String,
    client: reqwest::Client,
}

impl WebhookBot {
    // == Constructor ==
    /// Creates a bot posting to `webhook`.
    pub fn new(webhook: impl Into<String>) -> Self {
        Self {
            webhook: webhook.into(),
            client: reqwest::Client::new(),
        }
    }

    // == Send ==
    /// Delivers one message.
    ///
    /// Transport failures surface as `Http`; a response with a non-zero
    /// `errcode` surfaces as `Webhook`.
    pub async fn send(&self, msg: &TextMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook)
            .json(msg)
            .send()
            .await?;

        let hook: HookResponse = response.json().await?;
        if hook.errcode != 0 {
            return Err(NotifierError::Webhook {
                code: hook.errcode,
                message: hook.errmsg,
            });
        }

        debug!("webhook accepted message: {}", msg.content());
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_response_parses() {
        let resp: HookResponse =
            serde_json::from_str(r#"{"errcode": 0, "errmsg": "ok"}"#).unwrap();
        assert_eq!(resp.errcode, 0);
        assert_eq!(resp.errmsg, "ok");
    }

    #[test]
    fn test_hook_response_errmsg_optional() {
        let resp: HookResponse = serde_json::from_str(r#"{"errcode": 93000}"#).unwrap();
        assert_eq!(resp.errcode, 93000);
        assert!(resp.errmsg.is_empty());
    }
}
