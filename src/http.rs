//! HTTP+JSON fetcher
//!
//! [`HttpJsonFetcher`] turns each identifier into a GET request and decodes
//! the JSON body into a caller-chosen record type. Identifiers are either
//! absolute `http(s)` URLs, fetched as-is, or resource keys appended as one
//! path segment to the configured base URL.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::types::Identifier;

/// Fetches one JSON document per identifier and decodes it as `T`
pub struct HttpJsonFetcher<T> {
    /// Shared HTTP client (carries timeout and user agent)
    client: reqwest::Client,

    /// Base URL for resource keys
    base_url: Option<Url>,

    _record: PhantomData<fn() -> T>,
}

impl<T> HttpJsonFetcher<T> {
    /// Create a fetcher from the fetch settings
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be created
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .map(parse_base_url)
            .transpose()?;

        Ok(Self {
            client,
            base_url,
            _record: PhantomData,
        })
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client, base_url: Option<&str>) -> Result<Self> {
        Ok(Self {
            client,
            base_url: base_url.map(parse_base_url).transpose()?,
            _record: PhantomData,
        })
    }

    /// The URL an identifier is fetched from
    ///
    /// # Errors
    /// Returns [`Error::InvalidIdentifier`] for blank identifiers, and for
    /// resource keys when no base URL is configured
    pub fn resolve(&self, identifier: &Identifier) -> Result<Url> {
        let raw = identifier.as_str().trim();
        if raw.is_empty() {
            return Err(Error::InvalidIdentifier("identifier is empty".to_string()));
        }

        if let Ok(url) = Url::parse(raw)
            && matches!(url.scheme(), "http" | "https")
        {
            return Ok(url);
        }

        let Some(base) = &self.base_url else {
            return Err(Error::InvalidIdentifier(format!(
                "{raw} is not an absolute URL and no base URL is configured"
            )));
        };

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("fetch.base_url", format!("{base} cannot be a base")))?
            .pop_if_empty()
            .push(raw);
        Ok(url)
    }
}

fn parse_base_url(base: &str) -> Result<Url> {
    let url = Url::parse(base)?;
    if url.cannot_be_a_base() {
        return Err(Error::config(
            "fetch.base_url",
            format!("{base} cannot be used as a base URL"),
        ));
    }
    Ok(url)
}

#[async_trait]
impl<T> Fetcher for HttpJsonFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Record = T;

    async fn fetch_one(&self, identifier: &Identifier) -> Result<T> {
        let url = self.resolve(identifier)?;
        debug!(url = %url, "Fetching record");

        let response = self.client.get(url.clone()).send().await?;

        // Check HTTP status before trying to decode the body
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
