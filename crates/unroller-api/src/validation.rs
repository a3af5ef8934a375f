//! Request validation.
//!
//! A request must identify its document and carry at least one of the
//! fields the chosen operation can unroll.

use unroller_core::{Content, Error, Field, Result};

/// The family of an unroll route, which decides the fields it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Published content: `/content`, `/content-preview`.
    Content,
    /// Internal components: `/internalcontent`, `/internalcontent-preview`.
    InternalContent,
}

impl ContentKind {
    /// Fields of which at least one must be present.
    pub const fn unrollable_fields(self) -> &'static [Field] {
        match self {
            Self::Content => &[Field::MainImage, Field::BodyXml, Field::AlternativeImages],
            Self::InternalContent => &[Field::LeadImages, Field::BodyXml],
        }
    }
}

/// Checks `content` and returns its UUID.
pub fn validate(content: &Content, kind: ContentKind) -> Result<String> {
    let uuid = content
        .uuid()
        .ok_or_else(|| Error::missing_id("expected a string containing a UUID"))?;

    let fields = kind.unrollable_fields();
    if !fields.iter().any(|field| content.contains(*field)) {
        let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
        return Err(Error::invalid_content(format!(
            "expected at least one of {}",
            names.join(", ")
        )));
    }

    Ok(uuid)
}
