//! Paygate - Payment orchestration service
//!
//! Creates payment intents with an external provider, tracks payment
//! lifecycle, and fans out HMAC-signed webhook notifications to registered
//! B2B partners.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
