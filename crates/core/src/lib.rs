//! Core types for the pair feed monitor
//!
//! This crate provides the plain data shared by every component:
//! - Pair, token and security assessment records
//! - Risk classification and feed summaries
//! - The bounded activity log
//! - Configuration and error types

pub mod types;
pub mod tokens;
pub mod risk;
pub mod activity;
pub mod config;
pub mod errors;
pub mod serde_utils;

pub use types::*;
pub use tokens::*;
pub use risk::*;
pub use activity::*;
pub use config::*;
pub use errors::*;
