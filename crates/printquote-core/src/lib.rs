//! # printquote-core
//!
//! Core crate for PrintQuote. Contains configuration schemas, boundary
//! traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other PrintQuote crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
