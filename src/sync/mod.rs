//! # Remote Diff & Sync
//!
//! Reconciles the in-process set of declared commands against the remote
//! deployment, issuing the minimum number of bulk-replace calls. Runs once
//! at startup; a failure here is fatal.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod canonical;
pub mod diff;

pub use canonical::{build_payload, CanonicalCommand, CommandPayload, PayloadChoice, PayloadOption};
pub use diff::{sync_commands, CommandScope, CommandsGateway, SyncReport};
