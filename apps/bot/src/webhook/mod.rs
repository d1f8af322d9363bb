//! Inbound WhatsApp webhook: decode, classify, reply with TwiML.

pub mod dispatch;
pub mod handlers;

pub use dispatch::{Dispatcher, InboundMessage};
