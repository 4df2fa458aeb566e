use async_trait::async_trait;
use std::collections::HashMap;

use crate::{error::StationError, model::StationEntry};

use super::ObservationSource;

/// Serves canned bodies keyed by station URL. Unknown URLs answer 404.
///
/// Useful for replaying captured responses or exercising the pipeline offline.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bodies: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.bodies.insert(url.into(), body.into());
    }
}

#[async_trait]
impl ObservationSource for MemorySource {
    async fn fetch(&self, station: &StationEntry) -> Result<String, StationError> {
        match self.bodies.get(&station.url) {
            None => Err(StationError::Status { status: 404, body: String::new() }),
            Some(body) if body.trim().is_empty() => Err(StationError::EmptyBody),
            Some(body) => Ok(body.clone()),
        }
    }
}
