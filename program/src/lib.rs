//! Content-addressed blueprint registry and deterministic instance factory.
//!
//! Blueprints are registered once per content hash and tracked through an
//! active/inactive lifecycle. The factory creates instances of them (minimal
//! proxies bound to a reference implementation, or raw payloads) at program
//! derived addresses that can be computed before the transaction is sent,
//! and keeps a ledger of every instance it created.

pub mod accounts;
pub mod address;
pub mod constants;
#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;
pub mod error;
pub mod event;
pub mod factory;
pub mod host;
pub mod hub;
pub mod instruction;
pub mod processor;
pub mod registry;
pub mod state;
pub mod store;
