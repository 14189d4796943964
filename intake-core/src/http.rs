//! HTTP directory client.
//!
//! Talks to a lookup endpoint that accepts `{"domain": "..."}` and answers
//! `{"found": bool, "company": {"name", "min_size", "max_size"}}`. The body
//! is decoded leniently: a missing or non-string `name` becomes `""`, and
//! `found: true` without a company record is treated as not found.
//!
//! Every request carries a client-side timeout. The enrichment race does not
//! cancel a losing lookup, so this timeout is what ends a hung request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::directory::CompanyDirectory;
use crate::error::DirectoryError;
use crate::types::{Company, LookupResult};

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    domain: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    found: bool,
    #[serde(default)]
    company: Option<WireCompany>,
}

#[derive(Debug, Deserialize)]
struct WireCompany {
    #[serde(default)]
    name: Option<serde_json::Value>,
    min_size: i64,
    max_size: i64,
}

impl From<WireResponse> for LookupResult {
    fn from(wire: WireResponse) -> Self {
        match (wire.found, wire.company) {
            (true, Some(c)) => LookupResult::found(Company {
                name: c
                    .name
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                min_size: c.min_size,
                max_size: c.max_size,
            }),
            _ => LookupResult::not_found(),
        }
    }
}

/// Upper bound on a single directory request, losers of the race included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpDirectory {
    client: reqwest::Client,
    url: String,
}

impl HttpDirectory {
    pub fn new(url: impl Into<String>) -> Result<Self, DirectoryError> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompanyDirectory for HttpDirectory {
    async fn lookup(&self, domain: &str) -> Result<LookupResult, DirectoryError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&LookupRequest { domain })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DirectoryError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.bytes().await?;
        let wire: WireResponse =
            serde_json::from_slice(&body).map_err(|e| DirectoryError::Decode(e.to_string()))?;
        Ok(wire.into())
    }
}
