//! Service layer for simtrack
//!
//! Centralizes business logic between the HTTP surface and the storage,
//! provider, and GOIP clients.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::ref_patterns, reason = "Ref patterns are clearer in some contexts")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::cognitive_complexity, reason = "Complex async flows are inherent")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

mod error;
mod history_service;
mod provision;
#[cfg(test)]
mod provision_tests;
mod reconcile;
#[cfg(test)]
mod reconcile_tests;
mod registry_service;
mod retry;

pub use error::ServiceError;
pub use history_service::HistoryService;
pub use provision::{ProvisionEntry, ProvisionReport, ProvisionService};
pub use reconcile::{CleanupReport, CycleReport, IngestReport, ReconcileService, RecordOutcome};
pub use registry_service::RegistryService;
pub use retry::RetryPolicy;
