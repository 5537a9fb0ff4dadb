//! Nullable infrastructure for deterministic testing.
//!
//! External collaborators are abstracted behind traits in the wallet
//! engine. This crate provides test-friendly implementations that:
//! - Run in-process with no network
//! - Can be controlled programmatically (inject deposits, bounties, failures)
//! - Record what the engine asked them, for assertions
//!
//! Usage: hand a [`NullSettlement`] to the wallet in place of the HTTP client.

pub mod settlement;

pub use settlement::NullSettlement;
