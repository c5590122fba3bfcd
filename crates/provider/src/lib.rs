//! Provider gateway client for simtrack
//!
//! Thin typed wrapper over the provider's single-endpoint JSON API. All
//! operations are one POST with an `act` discriminator and an API key query
//! parameter; none retry internally.

mod client;
mod error;
pub mod types;

pub use client::ProviderClient;
pub use error::ProviderError;
