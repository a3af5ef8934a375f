//! Content sources: where referenced content is read from.

mod http;
#[cfg(any(test, feature = "test-utils"))]
mod mock;
mod provider;
mod retry;

pub use http::{
    BatchReader, PreviewReader, TRANSACTION_ID_HEADER, USER_AGENT_VALUE, build_client,
};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockSource;
pub use provider::{ContentMap, ContentSource, ContentSources};
pub use retry::RetryingSource;
