//! # Outbreak Server
//!
//! Host-side integration for the mode core:
//!
//! - **Data loading**: role, weapon, and settings files in RON, validated
//!   before they reach the catalog
//! - **Persistence**: a JSON-file record store whose writes run on a
//!   detached task so the tick loop never blocks on disk
//! - **Driving**: a tick driver that pumps the mode and hands drained
//!   effects to the host
//!
//! The core crate stays free of IO and clocks; everything that touches
//! the filesystem or a runtime lives here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod data_loader;
pub mod runtime;
pub mod store;

pub use data_loader::{
    default_data_dir, load_catalog, load_catalog_or_empty, load_settings, DataLoadError,
};
pub use runtime::TickDriver;
pub use store::JsonRecordStore;
