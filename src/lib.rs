//! PayPal Webhooks - Verified, idempotent webhook ingestion
//!
//! This crate authenticates PayPal webhook deliveries (transmission
//! signature over a canonical message, checked against PayPal's signing
//! certificate) and routes verified events to business handlers at most
//! once per event.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
