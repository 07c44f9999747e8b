//! Broadcast dispatch core contracts and value types.
//!
//! This crate holds the data model shared by the dispatch engine and its
//! adapters: payloads, recipients, pacing policies, audit records, the
//! capability traits the engine consumes, and the recipient resolver that
//! turns group memberships into a deduplicated send list.
pub mod audit;
pub mod capabilities;
pub mod delay;
pub mod payload;
pub mod phone;
pub mod recipient;
pub mod resolver;
pub mod validate;

pub use audit::*;
pub use capabilities::*;
pub use delay::*;
pub use payload::*;
pub use recipient::*;
pub use resolver::*;
pub use validate::*;
