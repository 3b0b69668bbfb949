//! # qk-core
//!
//! Core types for querykit.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Error types scoped to the offending query key or field
//! - Result type aliases
//! - Parser configuration

pub mod error;
pub mod result;
pub mod config;

pub use error::*;
pub use result::*;
pub use config::{ConfigError, ParserConfig, PlaceholderStyle};
