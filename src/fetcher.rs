//! HTTP page fetcher.
//!
//! Requests pages of a JSON list API and decodes them into [`Page`]s.
//! The response shape is configurable so the same fetcher works against
//! APIs that name their list and cursor fields differently.
//!
//! # Configuration
//!
//! ```toml
//! [source]
//! endpoint = "https://api.example.org/countries"
//! items_field = "countries"
//! next_field = "next"
//! key_field = "name"
//! artifact_field = "countryInfo.flag"
//! ```
//!
//! # Cursor Resolution
//!
//! | Cursor | Request URL |
//! |--------|-------------|
//! | none | `endpoint` |
//! | `https://…` / `http://…` | the cursor itself |
//! | `/path?…` or `?query` | cursor joined onto `endpoint` |
//! | anything else | `endpoint` with `cursor_param=<cursor>` |
//!
//! # Page Shape
//!
//! ```json
//! { "countries": [ { "name": "Aruba", "countryInfo": { "flag": "…" } } ],
//!   "next": "/countries?page=2" }
//! ```
//!
//! A missing, `null`, or empty-string `next` all mean end of list.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::models::{Item, Page};
use crate::traits::PageFetcher;

/// A [`PageFetcher`] backed by `reqwest`.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    endpoint: Url,
    config: SourceConfig,
}

impl HttpPageFetcher {
    /// Build a fetcher from the `[source]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP
    /// client cannot be constructed.
    pub fn new(config: SourceConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|_| FetchError::InvalidUrl(config.endpoint.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Compute the request URL for a cursor (see the module table).
    pub fn page_url(&self, cursor: Option<&str>) -> Result<Url, FetchError> {
        let cursor = match cursor {
            None => return Ok(self.endpoint.clone()),
            Some(c) => c,
        };

        if cursor.starts_with("http://") || cursor.starts_with("https://") {
            return Url::parse(cursor).map_err(|_| FetchError::InvalidUrl(cursor.to_string()));
        }

        if cursor.starts_with('/') || cursor.starts_with('?') {
            return self
                .endpoint
                .join(cursor)
                .map_err(|_| FetchError::InvalidUrl(cursor.to_string()));
        }

        // Opaque token: replace any existing cursor param on the endpoint
        let param = self.config.cursor_param.as_str();
        let kept: Vec<(String, String)> = self
            .endpoint
            .query_pairs()
            .filter(|(k, _)| k != param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(param, cursor);
        Ok(url)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page, FetchError> {
        let url = self.page_url(cursor)?;
        debug!(url = %url, "fetching page");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("{}: {}", url, e)))?;

        let page = decode_page(&body, &self.config)?;
        debug!(
            url = %url,
            items = page.items.len(),
            has_next = page.next.is_some(),
            "decoded page"
        );
        Ok(page)
    }
}

/// Decode a page response body using the field names in `config`.
///
/// Fails as a whole if any item record lacks its key or artifact field;
/// a partially decoded page is never returned.
pub fn decode_page(body: &Value, config: &SourceConfig) -> Result<Page, FetchError> {
    if !body.is_object() {
        return Err(FetchError::Decode(
            "expected a JSON object at the top level".to_string(),
        ));
    }

    let records = lookup_path(body, &config.items_field)
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            FetchError::Decode(format!("missing '{}' array", config.items_field))
        })?;

    let next = match lookup_path(body, &config.next_field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            return Err(FetchError::Decode(format!(
                "'{}' must be a string, got {}",
                config.next_field, other
            )))
        }
    };

    let mut items = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let name = string_field(record, &config.key_field, index)?;
        let artifact_url = string_field(record, &config.artifact_field, index)?;
        items.push(Item {
            name,
            artifact_url,
            raw: record.clone(),
        });
    }

    Ok(Page::new(items, next))
}

fn string_field(record: &Value, path: &str, index: usize) -> Result<String, FetchError> {
    lookup_path(record, path)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            FetchError::Decode(format!("item {} has no string field '{}'", index, path))
        })
}

/// Follow a dotted path (`countryInfo.flag`) through nested objects.
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, segment| v.get(segment))
}
