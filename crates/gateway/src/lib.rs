//! # Gateway
//!
//! The deployable Herdpulse service: configuration, the HTTP ingestion
//! and read API, and the WebSocket dashboard stream. All pipeline
//! semantics live in the `telemetry` and `notify` crates; this crate
//! wires them to the network.

// Service configuration
pub mod config;

// HTTP surface
pub mod server;

// WebSocket stream endpoint
pub mod ws;
