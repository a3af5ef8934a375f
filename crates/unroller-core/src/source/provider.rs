//! Content source abstraction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::content::Content;

/// Fetched content keyed by UUID.
///
/// A requested UUID with no entry was not found upstream; that is not an
/// error.
pub type ContentMap = HashMap<String, Content>;

/// Abstraction over the upstream stores content is read from.
///
/// This trait lets the unroller run against the batch content API, the
/// per-item preview API, or a test double without changing its logic.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches the given UUIDs.
    ///
    /// The returned map may hold only a subset of `uuids`. An error means
    /// the upstream call itself failed.
    async fn fetch(&self, uuids: &[String], tid: &str) -> Result<ContentMap>;

    /// Name of the upstream application, for logs and health checks.
    fn name(&self) -> &str {
        "content-source"
    }
}

/// The four sources an unroller reads from.
#[derive(Clone)]
pub struct ContentSources {
    /// Public content, batch API (with image set member expansion).
    pub content: Arc<dyn ContentSource>,
    /// Internal components, batch API.
    pub internal: Arc<dyn ContentSource>,
    /// Public content, preview API.
    pub preview: Arc<dyn ContentSource>,
    /// Internal components, preview API.
    pub internal_preview: Arc<dyn ContentSource>,
}

impl ContentSources {
    /// Uses one source for every role. Mostly useful in tests.
    pub fn uniform(source: Arc<dyn ContentSource>) -> Self {
        Self {
            content: source.clone(),
            internal: source.clone(),
            preview: source.clone(),
            internal_preview: source,
        }
    }
}

impl std::fmt::Debug for ContentSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSources")
            .field("content", &self.content.name())
            .field("internal", &self.internal.name())
            .field("preview", &self.preview.name())
            .field("internal_preview", &self.internal_preview.name())
            .finish()
    }
}
