//! WhatsApp gateway adapter implementing [`bcast_core::MessageSender`].

mod body;
mod config;
mod sender;

pub use body::request_for;
pub use config::GatewayConfig;
pub use sender::{GatewaySender, classify_status};
