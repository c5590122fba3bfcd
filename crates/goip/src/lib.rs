//! GOIP gateway client for simtrack
//!
//! Reads received SMS off the SIM bank's HTTP endpoint per port. Message
//! bodies arrive base64-encoded; a body that fails to decode becomes a
//! placeholder, not an error.

mod client;
mod error;

pub use client::{GoipClient, decode_content};
pub use error::GoipError;
