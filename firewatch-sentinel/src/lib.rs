//! firewatch-sentinel library interface
//!
//! The detection fusion and persistent event engine: polls satellite
//! hotspot feeds, fuses repeated detections into distinct fire events, and
//! gates alert escalation. See `pipeline::Sentinel` for the cycle loop.

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod services;

pub use config::SentinelConfig;
pub use pipeline::{CycleSummary, FeedBinding, Sentinel};
