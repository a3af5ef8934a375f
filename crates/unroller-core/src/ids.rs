//! Identifier utilities.
//!
//! Content is identified by the UUID embedded in its `id`/`url`, for example
//! `http://www.ft.com/thing/639cd952-149f-11e7-2ea7-a07ecd9ac73f`.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("UUID pattern is a valid regex")
});

/// Extract the first UUID found anywhere in `value`.
///
/// # Example
///
/// ```
/// use unroller_core::ids::extract_uuid;
///
/// assert_eq!(
///     extract_uuid("http://www.ft.com/thing/639cd952-149f-11e7-2ea7-a07ecd9ac73f").as_deref(),
///     Some("639cd952-149f-11e7-2ea7-a07ecd9ac73f")
/// );
/// assert_eq!(extract_uuid("http://www.ft.com/thing/"), None);
/// ```
pub fn extract_uuid(value: &str) -> Option<String> {
    UUID_PATTERN.find(value).map(|m| m.as_str().to_string())
}

/// Whether `value` is exactly a UUID and nothing else.
pub fn is_uuid(value: &str) -> bool {
    value.len() == 36 && UUID_PATTERN.find(value).is_some_and(|m| m.start() == 0)
}

/// Build the canonical id of an item served under `handler_path` by `api_host`.
///
/// This is the only place where output identifiers are synthesized rather
/// than passed through from upstream.
pub fn create_id(api_host: &str, handler_path: &str, uuid: &str) -> String {
    format!("http://{api_host}/{handler_path}/{uuid}")
}
