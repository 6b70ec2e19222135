//! Host-simulation layer.
//!
//! The stores assume an execution host that provides caller identity,
//! atomic all-or-nothing invocations, a value-transfer primitive, and an
//! ordered event log. This module is an in-process implementation of
//! that contract: a [`Runtime`] owning the three stores and a
//! native-currency table, a serializable [`Call`] dispatch surface, a
//! [`Keyring`] of named local accounts, and version-wrapped JSON
//! snapshots of the whole market state.
//!
//! # Modules
//!
//! - [`call`] — the dispatch surface and replies.
//! - [`runtime`] — store ownership, genesis wiring, dispatch, payment
//!   forwarding, the global event log.
//! - [`keyring`] — named accounts backed by generated Ed25519 keys.
//! - [`snapshot`] — snapshot save/load.

pub mod call;
pub mod keyring;
pub mod runtime;
pub mod snapshot;

pub use call::{Call, LedgerCall, RegistryCall, Reply, Target, TradingCall};
pub use keyring::{Account, Keyring};
pub use runtime::{EventRecord, Runtime, RuntimeBuilder};
