//! # Authentication Module
//!
//! Session Authority for the dashboard: credential decoding, remote
//! verification, subscribable per-credential session stores and the axum
//! middleware that gates views behind them.

pub mod authority;
pub mod hub;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod store;

pub use authority::{SessionAuthority, SessionVerifier, VerificationMode};
pub use hub::SessionHub;
pub use middleware::{SessionContext, SessionGate};
pub use models::SessionState;
