//! Mock content source for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::provider::{ContentMap, ContentSource};
use crate::content::Content;
use crate::{Error, Result};

/// Mock source that serves canned content.
///
/// Clones share the call log, so a test can keep one handle while the
/// unroller owns another.
#[derive(Clone, Default)]
pub struct MockSource {
    contents: HashMap<String, Content>,
    failure: Option<u16>,
    expand_members: bool,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockSource {
    /// Creates a source that knows no content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source whose every fetch fails with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            failure: Some(status),
            ..Self::default()
        }
    }

    /// Serves `content` under the UUID in its own `id`.
    ///
    /// Content without a derivable UUID is ignored.
    pub fn with_content(mut self, content: Content) -> Self {
        if let Some(uuid) = content.uuid() {
            self.contents.insert(uuid, content);
        }
        self
    }

    /// Serves `content` under an explicit UUID.
    pub fn with_entry(mut self, uuid: impl Into<String>, content: Content) -> Self {
        self.contents.insert(uuid.into(), content);
        self
    }

    /// Also serve the known members of every image set returned, like the
    /// public batch reader does.
    pub fn with_member_expansion(mut self) -> Self {
        self.expand_members = true;
        self
    }

    /// Number of fetch calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The UUID lists of every fetch call, in call order.
    pub async fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().await.clone()
    }

    fn lookup(&self, uuid: &str) -> Option<(String, Content)> {
        self.contents
            .get(uuid)
            .map(|content| (uuid.to_string(), content.clone()))
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn fetch(&self, uuids: &[String], _tid: &str) -> Result<ContentMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(uuids.to_vec());

        if let Some(status) = self.failure {
            return Err(Error::upstream_status(self.name(), status));
        }

        let mut map: ContentMap = uuids
            .iter()
            .filter_map(|uuid| self.lookup(uuid))
            .collect();

        if self.expand_members {
            let members: Vec<String> = map.values().flat_map(Content::member_uuids).collect();
            map.extend(members.iter().filter_map(|uuid| self.lookup(uuid)));
        }
        Ok(map)
    }

    fn name(&self) -> &str {
        "mock-source"
    }
}
