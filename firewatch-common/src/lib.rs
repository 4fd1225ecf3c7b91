//! Shared types for the FIREWATCH services
//!
//! Holds the common error type and configuration resolution used by the
//! sentinel (and any future reporting binaries sharing the fires table).

pub mod config;
pub mod error;

pub use error::{Error, Result};
