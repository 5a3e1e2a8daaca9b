//! REST polling transport backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use lanyard_common::SubjectId;
use tracing::debug;

use super::{FetchResponse, PresenceFetcher};
use crate::error::TransportError;

pub struct HttpFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lanyard-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Creation(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PresenceFetcher for HttpFetcher {
    fn endpoint(&self, subject: &SubjectId) -> String {
        format!("{}/{}", self.base_url, subject)
    }

    async fn fetch(&self, subject: &SubjectId) -> Result<FetchResponse, TransportError> {
        let url = self.endpoint(subject);
        debug!(url = %url, "GET presence");

        let response = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(FetchResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::Creation(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}
