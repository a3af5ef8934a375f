//! Retry wrapper for content sources.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};

use super::provider::{ContentMap, ContentSource};
use crate::{Error, Result};

/// Wraps a content source with retry logic.
///
/// Only errors for which [`Error::is_retryable`] holds are retried.
pub struct RetryingSource {
    inner: Arc<dyn ContentSource>,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryingSource {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max attempts: 3
    /// - Initial delay: 100 milliseconds
    /// - Max delay: 2 seconds
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            inner: source,
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }

    /// Sets the maximum number of attempts, including the first one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }
}

#[async_trait]
impl ContentSource for RetryingSource {
    async fn fetch(&self, uuids: &[String], tid: &str) -> Result<ContentMap> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize);

        let inner = &self.inner;
        (|| async move { inner.fetch(uuids, tid).await })
            .retry(backoff)
            .when(Self::should_retry)
            .notify(|err: &Error, delay: Duration| {
                tracing::warn!(source = inner.name(), ?delay, "Retrying fetch: {err}");
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
