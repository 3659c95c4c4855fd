//! # Mixhall Common Library
//!
//! Shared code for mixhall services including:
//! - Database schema, content store and submission repository queries
//! - Typed submission payloads and their validation
//! - Display id generation and validation
//! - Configuration loading
//! - Error taxonomy

pub mod config;
pub mod db;
pub mod display_id;
pub mod error;
pub mod payload;

pub use error::{Error, Result};
