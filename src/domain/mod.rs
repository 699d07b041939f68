//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `webhook` - PayPal delivery authentication, event model and dispatch

pub mod webhook;
