//! # Worldforge Development Tools
//!
//! Command-line tools for content authors:
//! - Data validators
//! - Composition summaries and JSON dumps
//! - Traversal verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod report;
pub mod validate;

pub use error::{Result, ToolError};
