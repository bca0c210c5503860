//! VeriGeek forum server library.
//!
//! Exposes the state, persistence, and handler modules so the integration
//! tests can drive the service without going over the network.

pub mod auth;
pub mod handlers;
pub mod persistence;
pub mod rate_limit;
pub mod state;
