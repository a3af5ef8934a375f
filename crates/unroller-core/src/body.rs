//! Embedded reference extraction from body markup.
//!
//! Embedded references are encoded in `bodyXML` as
//!
//! ```text
//! <ft-content data-embedded="true"
//!             type="http://www.ft.com/ontology/content/ImageSet"
//!             url="http://api.ft.com/content/639cd952-149f-11e7-2ea7-a07ecd9ac73f"></ft-content>
//! ```
//!
//! The markup is parsed with a tolerant HTML parser, so malformed bodies
//! yield a partial (often empty) result rather than an error.

use scraper::{ElementRef, Html};

use crate::ids::extract_uuid;

/// Tag name of an embedded reference.
pub const EMBED_TAG: &str = "ft-content";

/// Ontology type of an image set.
pub const IMAGE_SET_TYPE: &str = "http://www.ft.com/ontology/content/ImageSet";

/// Ontology type of dynamic content.
pub const DYNAMIC_CONTENT_TYPE: &str = "http://www.ft.com/ontology/content/DynamicContent";

const EMBEDDED_ATTR: &str = "data-embedded";
const TYPE_ATTR: &str = "type";
const URL_ATTRS: [&str; 2] = ["url", "id"];

/// Collect the UUIDs of embedded references whose `type` is one of
/// `accepted_types`.
///
/// Results are in document order and keep duplicates. Elements that match
/// but carry no extractable UUID are skipped with a diagnostic.
///
/// # Example
///
/// ```
/// use unroller_core::body::{extract_embedded, IMAGE_SET_TYPE};
///
/// let body = r#"<body><ft-content data-embedded="true"
///     type="http://www.ft.com/ontology/content/ImageSet"
///     url="http://api.ft.com/content/639cd952-149f-11e7-2ea7-a07ecd9ac73f"></ft-content></body>"#;
///
/// assert_eq!(
///     extract_embedded(body, &[IMAGE_SET_TYPE]),
///     vec!["639cd952-149f-11e7-2ea7-a07ecd9ac73f"]
/// );
/// ```
pub fn extract_embedded(body: &str, accepted_types: &[&str]) -> Vec<String> {
    let fragment = Html::parse_fragment(body);
    fragment
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == EMBED_TAG)
        .filter_map(|element| embedded_uuid(element, accepted_types))
        .collect()
}

fn embedded_uuid(element: ElementRef<'_>, accepted_types: &[&str]) -> Option<String> {
    let el = element.value();
    if el.attr(EMBEDDED_ATTR) != Some("true") {
        return None;
    }
    let content_type = el.attr(TYPE_ATTR)?;
    if !accepted_types.contains(&content_type) {
        return None;
    }

    let Some(reference) = URL_ATTRS.iter().find_map(|name| el.attr(name)) else {
        tracing::info!(content_type, "Embedded {EMBED_TAG} element has no url, skipping");
        return None;
    };
    let uuid = extract_uuid(reference);
    if uuid.is_none() {
        tracing::info!(reference, "Cannot extract UUID from embedded reference, skipping");
    }
    uuid
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "639cd952-149f-11e7-2ea7-a07ecd9ac73f";
    const B: &str = "71231d3a-13c7-11e7-2ea7-a07ecd9ac73f";
    const C: &str = "d02886fc-58ff-11e8-9859-6668838a4c10";

    fn embed(content_type: &str, uuid: &str) -> String {
        format!(
            r#"<ft-content data-embedded="true" type="{content_type}" url="http://api.ft.com/content/{uuid}"></ft-content>"#
        )
    }

    #[test]
    fn test_document_order_across_nesting() {
        let body = format!(
            "<body><p>{}</p><div><section><p>{}</p></section></div>{}</body>",
            embed(IMAGE_SET_TYPE, A),
            embed(IMAGE_SET_TYPE, B),
            embed(IMAGE_SET_TYPE, C),
        );
        assert_eq!(extract_embedded(&body, &[IMAGE_SET_TYPE]), vec![A, B, C]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let body = format!(
            "<body>{}{}{}</body>",
            embed(IMAGE_SET_TYPE, A),
            embed(IMAGE_SET_TYPE, B),
            embed(IMAGE_SET_TYPE, A)
        );
        assert_eq!(extract_embedded(&body, &[IMAGE_SET_TYPE]), vec![A, B, A]);
    }

    #[test]
    fn test_type_filtering() {
        let body = format!(
            "<body>{}{}</body>",
            embed(IMAGE_SET_TYPE, A),
            embed(DYNAMIC_CONTENT_TYPE, C)
        );
        assert_eq!(extract_embedded(&body, &[IMAGE_SET_TYPE]), vec![A]);
        assert_eq!(extract_embedded(&body, &[DYNAMIC_CONTENT_TYPE]), vec![C]);
        assert_eq!(
            extract_embedded(&body, &[IMAGE_SET_TYPE, DYNAMIC_CONTENT_TYPE]),
            vec![A, C]
        );
    }

    #[test]
    fn test_type_match_is_exact() {
        let body = embed("http://www.ft.com/ontology/content/ImageSetExtra", A);
        assert!(extract_embedded(&body, &[IMAGE_SET_TYPE]).is_empty());
        let body = embed("http://www.ft.com/ontology/content/Image", A);
        assert!(extract_embedded(&body, &[IMAGE_SET_TYPE]).is_empty());
    }

    #[test]
    fn test_requires_embedded_true() {
        let body = format!(
            r#"<body>
                <ft-content type="{IMAGE_SET_TYPE}" url="http://api.ft.com/content/{A}"></ft-content>
                <ft-content data-embedded="false" type="{IMAGE_SET_TYPE}" url="http://api.ft.com/content/{B}"></ft-content>
                <ft-content data-embedded="TRUE" type="{IMAGE_SET_TYPE}" url="http://api.ft.com/content/{C}"></ft-content>
            </body>"#
        );
        assert!(extract_embedded(&body, &[IMAGE_SET_TYPE]).is_empty());
    }

    #[test]
    fn test_missing_type_excluded() {
        let body = format!(
            r#"<ft-content data-embedded="true" url="http://api.ft.com/content/{A}"></ft-content>"#
        );
        assert!(extract_embedded(&body, &[IMAGE_SET_TYPE]).is_empty());
    }

    #[test]
    fn test_unextractable_uuid_skips_only_that_element() {
        let body = format!(
            r#"<body>
                <ft-content data-embedded="true" type="{IMAGE_SET_TYPE}" url="http://api.ft.com/content/nope"></ft-content>
                <ft-content data-embedded="true" type="{IMAGE_SET_TYPE}"></ft-content>
                {}
            </body>"#,
            embed(IMAGE_SET_TYPE, B)
        );
        assert_eq!(extract_embedded(&body, &[IMAGE_SET_TYPE]), vec![B]);
    }

    #[test]
    fn test_self_closing_elements() {
        let body = format!(
            r#"<body><ft-content data-embedded="true" type="{IMAGE_SET_TYPE}" url="http://api.ft.com/content/{A}"/><p>text</p><ft-content data-embedded="true" type="{IMAGE_SET_TYPE}" url="http://api.ft.com/content/{B}"/></body>"#
        );
        assert_eq!(extract_embedded(&body, &[IMAGE_SET_TYPE]), vec![A, B]);
    }

    #[test]
    fn test_other_tags_ignored() {
        let body = format!(
            r#"<body><ft-related data-embedded="true" type="{IMAGE_SET_TYPE}" url="http://api.ft.com/content/{A}"></ft-related></body>"#
        );
        assert!(extract_embedded(&body, &[IMAGE_SET_TYPE]).is_empty());
    }

    #[test]
    fn test_no_embedded_elements() {
        assert!(extract_embedded("<body><p>Sample body</p></body>", &[IMAGE_SET_TYPE]).is_empty());
    }

    #[test]
    fn test_malformed_and_empty_bodies() {
        assert!(extract_embedded("Sample body", &[IMAGE_SET_TYPE]).is_empty());
        assert!(extract_embedded("", &[IMAGE_SET_TYPE]).is_empty());
        assert!(extract_embedded("<body><p>unclosed <div>", &[IMAGE_SET_TYPE]).is_empty());
    }

    #[test]
    fn test_malformed_body_yields_partial_result() {
        let body = format!("<body><p>broken <div>{}", embed(IMAGE_SET_TYPE, A));
        assert_eq!(extract_embedded(&body, &[IMAGE_SET_TYPE]), vec![A]);
    }
}
