use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::StationError, model::StationEntry};

pub mod http;
pub mod memory;

pub use http::HttpSource;
pub use memory::MemorySource;

/// Somewhere station bodies can be fetched from.
#[async_trait]
pub trait ObservationSource: Send + Sync + Debug {
    /// Fetch the raw body published for `station`.
    ///
    /// A successful result is guaranteed non-empty.
    async fn fetch(&self, station: &StationEntry) -> Result<String, StationError>;
}
