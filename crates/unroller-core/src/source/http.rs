//! HTTP content sources.
//!
//! [`BatchReader`] asks the content store for many UUIDs in one call;
//! [`PreviewReader`] fans out one call per UUID to the preview API and
//! tolerates individual failures.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::Instrument;

use super::provider::{ContentMap, ContentSource};
use crate::content::Content;
use crate::ids::is_uuid;
use crate::{Error, Result};

/// Header carrying the transaction id to upstream services.
pub const TRANSACTION_ID_HEADER: &str = "X-Request-Id";

/// User agent sent on every upstream request.
pub const USER_AGENT_VALUE: &str = "content-unroller";

/// Builds the HTTP client shared by every source.
///
/// `timeout` is the deadline of each individual call.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(100)
        .tcp_keepalive(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::config(format!("http client: {e}")))
}

// ============================================================================
// Batch reader
// ============================================================================

/// Reads content in batches: `GET {url}?uuid=..&uuid=..`.
#[derive(Debug, Clone)]
pub struct BatchReader {
    client: reqwest::Client,
    app_name: String,
    url: String,
    expand_members: bool,
}

impl BatchReader {
    /// Creates a reader for the endpoint at `url`.
    pub fn new(
        client: reqwest::Client,
        app_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            app_name: app_name.into(),
            url: url.into(),
            expand_members: false,
        }
    }

    /// Also fetch the members of every image set returned.
    pub fn with_member_expansion(mut self) -> Self {
        self.expand_members = true;
        self
    }

    async fn get_batch(&self, uuids: &[String], tid: &str) -> Result<Vec<Content>> {
        let query: Vec<(&str, &str)> = uuids
            .iter()
            .filter(|uuid| is_uuid(uuid))
            .map(|uuid| ("uuid", uuid.as_str()))
            .collect();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(&self.url)
            .header(TRANSACTION_ID_HEADER, tid)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::fetch_with_source(&self.app_name, "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream_status(&self.app_name, status.as_u16()));
        }

        let items: Vec<Value> = response.json().await.map_err(|e| {
            Error::fetch_with_source(&self.app_name, "error unmarshalling response", e)
        })?;

        Ok(items.into_iter().filter_map(Content::from_json).collect())
    }
}

fn add_to_map(items: Vec<Content>, map: &mut ContentMap) {
    for item in items {
        match item.uuid() {
            Some(uuid) => {
                map.insert(uuid, item);
            }
            None => tracing::debug!("Dropping upstream item without a usable id"),
        }
    }
}

#[async_trait]
impl ContentSource for BatchReader {
    async fn fetch(&self, uuids: &[String], tid: &str) -> Result<ContentMap> {
        let mut map = ContentMap::new();
        let items = self.get_batch(uuids, tid).await?;

        let member_uuids: Vec<String> = if self.expand_members {
            items.iter().flat_map(Content::member_uuids).collect()
        } else {
            Vec::new()
        };
        add_to_map(items, &mut map);

        if !member_uuids.is_empty() {
            let members = self.get_batch(&member_uuids, tid).await?;
            add_to_map(members, &mut map);
        }

        tracing::debug!(
            source = %self.app_name,
            requested = uuids.len(),
            found = map.len(),
            "Batch fetch complete"
        );
        Ok(map)
    }

    fn name(&self) -> &str {
        &self.app_name
    }
}

// ============================================================================
// Preview reader
// ============================================================================

/// Reads content one item at a time: `GET {url}/{uuid}`, concurrently.
#[derive(Debug, Clone)]
pub struct PreviewReader {
    client: reqwest::Client,
    app_name: String,
    url: String,
}

impl PreviewReader {
    /// Creates a reader for items under `url`.
    pub fn new(
        client: reqwest::Client,
        app_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            app_name: app_name.into(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }
}

async fn get_one(
    client: reqwest::Client,
    app_name: String,
    url: String,
    tid: String,
) -> Result<Content> {
    let response = client
        .get(&url)
        .header(TRANSACTION_ID_HEADER, &tid)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .send()
        .await
        .map_err(|e| Error::fetch_with_source(&app_name, format!("request to {url} failed"), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::upstream_status(&app_name, status.as_u16()));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| Error::fetch_with_source(&app_name, "error unmarshalling response", e))?;
    Content::from_json(body)
        .ok_or_else(|| Error::fetch(&app_name, "response is not a JSON object"))
}

#[async_trait]
impl ContentSource for PreviewReader {
    async fn fetch(&self, uuids: &[String], tid: &str) -> Result<ContentMap> {
        let mut tasks = JoinSet::new();
        let unique: HashSet<&String> = uuids.iter().collect();

        for uuid in unique {
            let uuid = uuid.clone();
            let request = get_one(
                self.client.clone(),
                self.app_name.clone(),
                format!("{}/{}", self.url, uuid),
                tid.to_string(),
            );
            tasks.spawn(
                async move { (uuid, request.await) }.instrument(tracing::Span::current()),
            );
        }

        let mut map = ContentMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((uuid, Ok(content))) => {
                    map.insert(uuid, content);
                }
                Ok((uuid, Err(e))) => {
                    tracing::warn!(source = %self.app_name, %uuid, "Preview fetch failed: {e}");
                }
                Err(e) => {
                    tracing::warn!(source = %self.app_name, "Preview fetch task aborted: {e}");
                }
            }
        }
        Ok(map)
    }

    fn name(&self) -> &str {
        &self.app_name
    }
}
