//! # Backend Module
//!
//! HTTP client for the gifting backend that owns accounts, transactions,
//! users and gift counters.

pub mod client;
pub mod error;
pub mod models;

pub use client::BackendClient;
pub use error::BackendError;
