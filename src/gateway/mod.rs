//! # Discord Gateway Adapters
//!
//! The only modules that name serenity types: the event adapter feeding
//! the dispatcher, the responder answering interactions, and the
//! deployment gateway behind the sync routine. The dispatch core stays
//! transport-agnostic.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod commands_api;
pub mod events;
pub mod responder;

pub use commands_api::DiscordCommandsGateway;
pub use events::GatewayHandler;
pub use responder::{ResponderTarget, SerenityResponder};
