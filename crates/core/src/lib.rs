//! Core types and helpers for simtrack
//!
//! This crate contains domain types shared across all other crates.

mod dial_plan;
mod env_config;
mod history;
mod pending;
mod registry;
mod sms;

pub use dial_plan::*;
pub use env_config::*;
pub use history::*;
pub use pending::*;
pub use registry::*;
pub use sms::*;
