//! Core library for the `bom-geojson` tool.
//!
//! This crate defines:
//! - Configuration (station table, output path, selection and time rules)
//! - Abstraction over where station bodies come from
//! - Observation selection, timestamp normalization and GeoJSON assembly
//!
//! It is used by `bom-cli`, but can also be driven directly, e.g. with a
//! [`MemorySource`] holding captured responses.

pub mod config;
pub mod error;
pub mod feature;
pub mod model;
pub mod pipeline;
pub mod source;
pub mod timestamp;

pub use config::Config;
pub use error::StationError;
pub use model::{Observation, StationEntry};
pub use pipeline::{RunOptions, RunReport, Selection};
pub use source::{HttpSource, MemorySource, ObservationSource};
pub use timestamp::{NormalizedTime, TimeMode};
