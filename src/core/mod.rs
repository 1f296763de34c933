//! Core module
//!
//! Release ledger parsing, upstream sources, and reconciliation.

pub mod ledger;
pub mod reconcile;
pub mod sources;
pub mod version;
