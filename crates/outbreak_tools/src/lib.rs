//! # Outbreak Development Tools
//!
//! Command-line tools for working on mode data:
//! - Catalog and settings validation
//! - Record file inspection

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod records;
pub mod validate;
