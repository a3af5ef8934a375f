//! The content document model.
//!
//! A [`Content`] is a string-keyed JSON object with no statically enforced
//! schema. Every accessor matches on the underlying [`Value`] variant and
//! treats a missing or wrongly typed field as absent, so a malformed
//! document degrades instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::extract_uuid;

/// Well-known field names of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `id` — canonical URL of the item.
    Id,
    /// `type` — ontology type URI.
    Type,
    /// `bodyXML` — body markup.
    BodyXml,
    /// `mainImage` — reference to the main image set.
    MainImage,
    /// `embeds` — resolved embedded content.
    Embeds,
    /// `alternativeImages` — container for the promotional image.
    AlternativeImages,
    /// `promotionalImage` — lives inside `alternativeImages`.
    PromotionalImage,
    /// `leadImages` — list of lead image references.
    LeadImages,
    /// `members` — image set members.
    Members,
    /// `image` — resolved lead image content.
    Image,
}

impl Field {
    /// The JSON key for this field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Type => "type",
            Self::BodyXml => "bodyXML",
            Self::MainImage => "mainImage",
            Self::Embeds => "embeds",
            Self::AlternativeImages => "alternativeImages",
            Self::PromotionalImage => "promotionalImage",
            Self::LeadImages => "leadImages",
            Self::Members => "members",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content document: an article, an image set, an image, ...
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(Map<String, Value>);

impl Content {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Creates a stand-in carrying only an `id`.
    pub fn stub(id: impl Into<String>) -> Self {
        let mut content = Self::new();
        content.set(Field::Id, Value::String(id.into()));
        content
    }

    /// Raw access to a field.
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.0.get(field.as_str())
    }

    /// Whether the field is present, whatever its type.
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(field.as_str())
    }

    /// The field as a string, if it is one.
    pub fn str_field(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// The field as an object, if it is one.
    pub fn object_field(&self, field: Field) -> Option<&Map<String, Value>> {
        self.get(field).and_then(Value::as_object)
    }

    /// The field as a list, if it is one.
    pub fn array_field(&self, field: Field) -> Option<&Vec<Value>> {
        self.get(field).and_then(Value::as_array)
    }

    /// Mutable access to an object field.
    pub fn object_field_mut(&mut self, field: Field) -> Option<&mut Map<String, Value>> {
        self.0.get_mut(field.as_str()).and_then(Value::as_object_mut)
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, field: Field, value: impl Into<Value>) {
        self.0.insert(field.as_str().to_string(), value.into());
    }

    /// Removes a field.
    pub fn remove(&mut self, field: Field) -> Option<Value> {
        self.0.remove(field.as_str())
    }

    /// Copies every field of `src` over this document.
    pub fn merge(&mut self, src: &Content) {
        for (key, value) in &src.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// The UUID embedded in this document's `id`.
    pub fn uuid(&self) -> Option<String> {
        self.str_field(Field::Id).and_then(extract_uuid)
    }

    /// UUIDs of the `members` list, skipping members without a usable id.
    pub fn member_uuids(&self) -> Vec<String> {
        let Some(members) = self.array_field(Field::Members) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|m| m.get(Field::Id.as_str()).and_then(Value::as_str))
            .filter_map(extract_uuid)
            .collect()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether the document has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Content {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Content> for Value {
    fn from(content: Content) -> Self {
        Value::Object(content.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Content {
        Content::from_json(value).unwrap()
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(Content::from_json(json!([1, 2])).is_none());
        assert!(Content::from_json(json!("text")).is_none());
        assert!(Content::from_json(json!({})).is_some());
    }

    #[test]
    fn test_wrong_typed_fields_read_as_absent() {
        let content = doc(json!({
            "id": 42,
            "mainImage": "not-an-object",
            "leadImages": {"id": "x"},
        }));
        assert!(content.contains(Field::Id));
        assert!(content.str_field(Field::Id).is_none());
        assert!(content.object_field(Field::MainImage).is_none());
        assert!(content.array_field(Field::LeadImages).is_none());
        assert!(content.uuid().is_none());
    }

    #[test]
    fn test_clone_is_deep() {
        let original = doc(json!({"mainImage": {"id": "a"}}));
        let mut copy = original.clone();
        copy.object_field_mut(Field::MainImage)
            .unwrap()
            .insert("id".into(), json!("b"));
        assert_eq!(original.object_field(Field::MainImage).unwrap()["id"], "a");
    }

    #[test]
    fn test_merge_overwrites() {
        let mut target = doc(json!({"id": "x", "type": "old"}));
        target.merge(&doc(json!({"type": "new", "title": "t"})));
        assert_eq!(target.str_field(Field::Type), Some("new"));
        assert_eq!(target.as_map()["title"], "t");
        assert_eq!(target.str_field(Field::Id), Some("x"));
    }

    #[test]
    fn test_member_uuids() {
        let set = doc(json!({
            "members": [
                {"id": "http://www.ft.com/thing/639cd952-149f-11e7-b0c1-37e417ee6c76"},
                {"id": "no-uuid-here"},
                {"title": "missing id"},
                "not-an-object",
                {"id": "http://api.ft.com/content/71231d3a-13c7-11e7-b0c1-37e417ee6c76"},
            ]
        }));
        assert_eq!(
            set.member_uuids(),
            vec![
                "639cd952-149f-11e7-b0c1-37e417ee6c76",
                "71231d3a-13c7-11e7-b0c1-37e417ee6c76"
            ]
        );
        assert!(Content::new().member_uuids().is_empty());
    }

    #[test]
    fn test_stub() {
        let stub = Content::stub("http://api.ft.com/content/abc");
        assert_eq!(
            serde_json::to_value(&stub).unwrap(),
            json!({"id": "http://api.ft.com/content/abc"})
        );
    }

    #[test]
    fn test_deserialize_requires_object() {
        assert!(serde_json::from_str::<Content>("[]").is_err());
        let c: Content = serde_json::from_str(r#"{"bodyXML": "<body/>"}"#).unwrap();
        assert_eq!(c.str_field(Field::BodyXml), Some("<body/>"));
    }
}
