//! Bot Module
//!
//! Chat-webhook notification delivery: message DTOs and the HTTP client
//! that posts them.

mod message;
mod webhook;

pub use message::TextMessage;
pub use webhook::{HookResponse, WebhookBot};
