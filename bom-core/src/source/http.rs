use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::Duration;

use crate::{config::Config, error::StationError, model::StationEntry};

use super::ObservationSource;

/// Fetches station bodies over HTTP, one GET per station.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: Client,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, timeout })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.user_agent, config.timeout())
    }
}

#[async_trait]
impl ObservationSource for HttpSource {
    async fn fetch(&self, station: &StationEntry) -> Result<String, StationError> {
        tracing::debug!(station = %station.name, url = %station.url, "fetching");

        let res = self
            .http
            .get(&station.url)
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(StationError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        if body.trim().is_empty() {
            return Err(StationError::EmptyBody);
        }

        Ok(body)
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
