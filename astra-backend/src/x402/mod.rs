//! x402 Protocol support for payment-gated pricing endpoints
//!
//! This module handles the quote half of the x402 flow:
//! 1. Probe the endpoint with a minimal synthetic request
//! 2. If 402 is returned, parse the payment requirements
//! 3. Reduce them to a normalized quote fragment
//!
//! Settling the payment is a broker concern and lives outside this service.

mod client;
mod types;

pub use client::{ProbeMethod, X402Probe};
pub use types::*;
