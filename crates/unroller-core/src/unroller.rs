//! The unrolling engine.
//!
//! [`ContentUnroller`] replaces bare references in a content document with
//! the content they point to. Every operation works on a clone of the
//! submitted document; on an upstream failure the untouched original is
//! handed back inside the [`UnrollError`].

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{error, info, instrument};

use crate::body::{DYNAMIC_CONTENT_TYPE, IMAGE_SET_TYPE, extract_embedded};
use crate::content::{Content, Field};
use crate::error::UnrollError;
use crate::ids::{create_id, extract_uuid};
use crate::schema::{ReferenceSchema, Role};
use crate::source::{ContentMap, ContentSource, ContentSources};

/// Path segment used when synthesizing ids for unresolved content.
const STUB_HANDLER_PATH: &str = "content";

/// A single unroll request.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrollEvent {
    /// The submitted document.
    pub content: Content,
    /// Transaction id, propagated to upstream calls and logs.
    pub tid: String,
    /// UUID of the submitted document.
    pub uuid: String,
}

impl UnrollEvent {
    /// Creates a new event.
    pub fn new(content: Content, tid: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            content,
            tid: tid.into(),
            uuid: uuid.into(),
        }
    }
}

/// Resolves the references of content documents against upstream sources.
#[derive(Debug, Clone)]
pub struct ContentUnroller {
    sources: ContentSources,
    api_host: String,
}

impl ContentUnroller {
    /// Creates an unroller reading from `sources`.
    ///
    /// `api_host` is used to build the ids of stubs standing in for content
    /// that could not be found.
    pub fn new(sources: ContentSources, api_host: impl Into<String>) -> Self {
        Self {
            sources,
            api_host: api_host.into(),
        }
    }

    /// The host used in synthesized ids.
    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    /// The sources this unroller reads from.
    pub fn sources(&self) -> &ContentSources {
        &self.sources
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Unrolls the main image, promotional image and embedded image sets and
    /// dynamic content of a published document.
    #[instrument(name = "unroll", skip_all, fields(tid = %event.tid, uuid = %event.uuid))]
    pub async fn unroll_content(&self, event: &UnrollEvent) -> Result<Content, UnrollError> {
        let mut doc = event.content.clone();
        let embeds = self
            .unroll_images(&mut doc, &[IMAGE_SET_TYPE, DYNAMIC_CONTENT_TYPE], event)
            .await?;
        if !embeds.is_empty() {
            doc.set(Field::Embeds, embeds);
        }
        Ok(doc)
    }

    /// Like [`unroll_content`](Self::unroll_content), but dynamic content is
    /// read from the preview source and appended after the image sets.
    #[instrument(name = "unroll", skip_all, fields(tid = %event.tid, uuid = %event.uuid))]
    pub async fn unroll_content_preview(
        &self,
        event: &UnrollEvent,
    ) -> Result<Content, UnrollError> {
        let mut doc = event.content.clone();
        let mut embeds = self.unroll_images(&mut doc, &[IMAGE_SET_TYPE], event).await?;

        if let Some(dynamic) = self
            .unroll_dynamic_content(&doc, self.sources.preview.as_ref(), event)
            .await?
        {
            embeds.extend(dynamic);
        }
        if !embeds.is_empty() {
            doc.set(Field::Embeds, embeds);
        }
        Ok(doc)
    }

    /// Unrolls the lead images and embedded dynamic content of internal
    /// components.
    #[instrument(name = "unroll", skip_all, fields(tid = %event.tid, uuid = %event.uuid))]
    pub async fn unroll_internal_content(
        &self,
        event: &UnrollEvent,
    ) -> Result<Content, UnrollError> {
        self.unroll_internal(event, self.sources.internal.as_ref()).await
    }

    /// Like [`unroll_internal_content`](Self::unroll_internal_content), but
    /// dynamic content is read from the internal preview source.
    #[instrument(name = "unroll", skip_all, fields(tid = %event.tid, uuid = %event.uuid))]
    pub async fn unroll_internal_content_preview(
        &self,
        event: &UnrollEvent,
    ) -> Result<Content, UnrollError> {
        self.unroll_internal(event, self.sources.internal_preview.as_ref()).await
    }

    async fn unroll_internal(
        &self,
        event: &UnrollEvent,
        dynamic_source: &dyn ContentSource,
    ) -> Result<Content, UnrollError> {
        let mut doc = event.content.clone();
        self.unroll_lead_images(&mut doc, event).await?;

        if let Some(dynamic) = self
            .unroll_dynamic_content(&doc, dynamic_source, event)
            .await?
        {
            doc.set(Field::Embeds, dynamic);
        }
        Ok(doc)
    }

    // ========================================================================
    // Image sets
    // ========================================================================

    /// Resolves main image, embedded items and promotional image into `doc`.
    ///
    /// The resolved embeds are returned rather than written, since callers
    /// combine them differently.
    async fn unroll_images(
        &self,
        doc: &mut Content,
        accepted_types: &[&str],
        event: &UnrollEvent,
    ) -> Result<Vec<Value>, UnrollError> {
        let Some(schema) = build_schema(doc, accepted_types) else {
            return Ok(Vec::new());
        };

        let mut fetched = self
            .fetch(self.sources.content.as_ref(), &schema.flatten(), event)
            .await?;
        self.resolve_image_sets(&schema, &mut fetched);

        if let Some(uuid) = schema.get(Role::MainImage) {
            doc.set(Field::MainImage, self.resolved(uuid, &fetched));
        }

        if let Some(uuid) = schema.get(Role::PromotionalImage) {
            let promotional = self.resolved(uuid, &fetched);
            if let Some(alternatives) = doc.object_field_mut(Field::AlternativeImages) {
                alternatives.insert(Field::PromotionalImage.to_string(), promotional);
            }
        }

        Ok(self.positional(schema.get_all(Role::Embeds), &fetched))
    }

    /// Resolves the members of every image set referenced as main image or
    /// embed, one level deep. Sets missing from `fetched` become stubs.
    ///
    /// Every set is resolved against `fetched` as it was returned, so a set
    /// that is also a member of another set is never expanded twice.
    fn resolve_image_sets(&self, schema: &ReferenceSchema, fetched: &mut ContentMap) {
        let mut seen = HashSet::new();
        let sets: Vec<&str> = schema
            .get(Role::MainImage)
            .into_iter()
            .chain(schema.get_all(Role::Embeds).iter().map(String::as_str))
            .filter(|uuid| seen.insert(*uuid))
            .collect();

        let mut resolved = Vec::new();
        for uuid in sets {
            match fetched.get(uuid) {
                Some(set) => {
                    if let Some(members) = set.array_field(Field::Members) {
                        let members: Vec<Value> = members
                            .iter()
                            .filter_map(|member| resolve_member(member, fetched))
                            .collect();
                        resolved.push((uuid, Some(members)));
                    }
                }
                None => resolved.push((uuid, None)),
            }
        }

        for (uuid, members) in resolved {
            match members {
                Some(members) => {
                    if let Some(set) = fetched.get_mut(uuid) {
                        set.set(Field::Members, members);
                    }
                }
                None => {
                    fetched.insert(uuid.to_string(), self.stub(uuid));
                }
            }
        }
    }

    // ========================================================================
    // Lead images
    // ========================================================================

    async fn unroll_lead_images(
        &self,
        doc: &mut Content,
        event: &UnrollEvent,
    ) -> Result<(), UnrollError> {
        let Some(images) = doc.array_field(Field::LeadImages) else {
            info!("No lead images to expand for supplied content");
            return Ok(());
        };

        let uuids: Vec<Option<String>> = images
            .iter()
            .map(|item| {
                let uuid = item.as_object().and_then(id_uuid);
                if uuid.is_none() {
                    info!(lead_image = %item, "Cannot get UUID for lead image. Leaving it as is");
                }
                uuid
            })
            .collect();

        let mut schema = ReferenceSchema::new();
        schema.put_all(Role::LeadImages, uuids.iter().flatten().cloned());
        if schema.is_empty() {
            info!("No lead images to expand for supplied content");
            return Ok(());
        }

        let fetched = self
            .fetch(self.sources.content.as_ref(), &schema.flatten(), event)
            .await?;

        let expanded: Vec<Value> = images
            .iter()
            .zip(&uuids)
            .map(|(item, uuid)| match (item.as_object(), uuid) {
                (Some(raw), Some(uuid)) => {
                    let mut lead_image = Content::from(raw.clone());
                    match fetched.get(uuid) {
                        Some(image) => lead_image.set(Field::Image, image.clone()),
                        None => info!(%uuid, "Missing image model. Returning only the id"),
                    }
                    Value::from(lead_image)
                }
                _ => item.clone(),
            })
            .collect();

        doc.set(Field::LeadImages, expanded);
        Ok(())
    }

    // ========================================================================
    // Dynamic content
    // ========================================================================

    /// Resolves embedded dynamic content against `source`.
    ///
    /// Returns `None` when the body embeds no dynamic content.
    async fn unroll_dynamic_content(
        &self,
        doc: &Content,
        source: &dyn ContentSource,
        event: &UnrollEvent,
    ) -> Result<Option<Vec<Value>>, UnrollError> {
        let uuids = embedded_uuids(doc, &[DYNAMIC_CONTENT_TYPE]);
        if uuids.is_empty() {
            return Ok(None);
        }

        let mut schema = ReferenceSchema::new();
        schema.put_all(Role::Embeds, uuids.iter().cloned());
        let fetched = self.fetch(source, &schema.flatten(), event).await?;

        Ok(Some(self.positional(&uuids, &fetched)))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn fetch(
        &self,
        source: &dyn ContentSource,
        uuids: &[String],
        event: &UnrollEvent,
    ) -> Result<ContentMap, UnrollError> {
        source.fetch(uuids, &event.tid).await.map_err(|e| {
            error!(source = source.name(), "Error while getting content: {e}");
            UnrollError::new(event.uuid.clone(), event.content.clone(), e)
        })
    }

    fn stub(&self, uuid: &str) -> Content {
        Content::stub(create_id(&self.api_host, STUB_HANDLER_PATH, uuid))
    }

    fn resolved(&self, uuid: &str, fetched: &ContentMap) -> Value {
        fetched
            .get(uuid)
            .cloned()
            .unwrap_or_else(|| self.stub(uuid))
            .into()
    }

    /// One entry per occurrence in `uuids`, in order.
    fn positional(&self, uuids: &[String], fetched: &ContentMap) -> Vec<Value> {
        uuids
            .iter()
            .map(|uuid| self.resolved(uuid, fetched))
            .collect()
    }
}

/// Collects the image references of `doc`.
///
/// Returns `None` when there is nothing to unroll.
fn build_schema(doc: &Content, accepted_types: &[&str]) -> Option<ReferenceSchema> {
    let mut schema = ReferenceSchema::new();

    match doc.object_field(Field::MainImage).map(id_uuid) {
        Some(Some(uuid)) => schema.put(Role::MainImage, uuid),
        Some(None) => info!("Cannot find main image id. Skipping expanding main image"),
        None => info!("Cannot find main image. Skipping expanding main image"),
    }

    schema.put_all(Role::Embeds, embedded_uuids(doc, accepted_types));

    if let Some(alternatives) = doc.object_field(Field::AlternativeImages) {
        let promotional = alternatives
            .get(Field::PromotionalImage.as_str())
            .and_then(Value::as_object);
        match promotional.map(id_uuid) {
            Some(Some(uuid)) => schema.put(Role::PromotionalImage, uuid),
            Some(None) => info!(
                "Promotional image is missing a usable id. Skipping expanding promotional image"
            ),
            None => info!("Cannot find promotional image. Skipping expanding promotional image"),
        }
    }

    if schema.is_empty() {
        info!("No main image or body images or promotional image to expand");
        return None;
    }
    Some(schema)
}

fn embedded_uuids(doc: &Content, accepted_types: &[&str]) -> Vec<String> {
    match doc.str_field(Field::BodyXml) {
        Some(body) => extract_embedded(body, accepted_types),
        None => {
            info!("Missing body. Skipping expanding embedded content");
            Vec::new()
        }
    }
}

/// The UUID in the `id` of a nested reference object.
fn id_uuid(object: &Map<String, Value>) -> Option<String> {
    object
        .get(Field::Id.as_str())
        .and_then(Value::as_str)
        .and_then(extract_uuid)
}

/// Merges a raw image set member with its fetched content.
///
/// Members without a usable id are dropped; members that were not fetched
/// keep their raw fields.
fn resolve_member(member: &Value, fetched: &ContentMap) -> Option<Value> {
    let Some(raw) = member.as_object() else {
        info!(%member, "Dropping image set member that is not an object");
        return None;
    };
    let Some(uuid) = id_uuid(raw) else {
        info!(%member, "Cannot extract UUID from image set member. Dropping it");
        return None;
    };

    let mut resolved = Content::from(raw.clone());
    if let Some(content) = fetched.get(&uuid) {
        resolved.merge(content);
    }
    Some(resolved.into())
}
