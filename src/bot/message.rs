//! Webhook Message DTOs
//!
//! Wire format for chat-webhook text messages. The hook expects
//! `{"msgtype":"text","text":{"content":...},"at":{...}}` with camelCase
//! mention fields.

use serde::Serialize;

// == Text Message ==
/// A plain-text notification, optionally mentioning receivers by mobile
/// number or mentioning everyone.
#[derive(Debug, Clone, Serialize)]
pub struct TextMessage {
    msgtype: &'static str,
    text: TextContent,
    at: AtSpec,
}

#[derive(Debug, Clone, Serialize)]
struct TextContent {
    content: String,
}

#[derive(Debug, Clone, Default, Serialize)]
struct AtSpec {
    #[serde(rename = "atMobiles")]
    at_mobiles: Vec<String>,
    #[serde(rename = "atUserIds")]
    at_user_ids: Vec<String>,
    #[serde(rename = "isAtAll")]
    is_at_all: bool,
}

impl TextMessage {
    // == Constructor ==
    /// Creates a text message with no mentions.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            msgtype: "text",
            text: TextContent {
                content: content.into(),
            },
            at: AtSpec::default(),
        }
    }

    // == Builders ==
    /// Mentions a single receiver by mobile number.
    pub fn at_mobile(self, mobile: impl Into<String>) -> Self {
        self.at_mobiles([mobile.into()])
    }

    /// Mentions receivers by mobile number.
    pub fn at_mobiles(mut self, mobiles: impl IntoIterator<Item = String>) -> Self {
        self.at.at_mobiles.extend(mobiles);
        self
    }

    /// Mentions everyone in the channel.
    pub fn at_all(mut self) -> Self {
        self.at.is_at_all = true;
        self
    }

    /// The message body.
    pub fn content(&self) -> &str {
        &self.text.content
    }
}
