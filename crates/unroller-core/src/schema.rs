//! The reference schema: which identifiers play which role in a document.
//!
//! Roles are either single-valued ([`Role::MainImage`],
//! [`Role::PromotionalImage`]) or multi-valued ([`Role::Embeds`],
//! [`Role::LeadImages`]). Using the wrong accessor for a role is a no-op,
//! never an error.

use std::collections::{HashMap, HashSet};

/// Logical slot a reference occupies in its owning document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The main image set.
    MainImage,
    /// The promotional image, under `alternativeImages`.
    PromotionalImage,
    /// Items embedded in the body.
    Embeds,
    /// Lead images.
    LeadImages,
}

impl Role {
    /// Every role, in flattening order.
    pub const ALL: [Role; 4] = [
        Role::MainImage,
        Role::Embeds,
        Role::PromotionalImage,
        Role::LeadImages,
    ];

    /// Whether the role holds at most one identifier.
    pub const fn is_single(self) -> bool {
        matches!(self, Role::MainImage | Role::PromotionalImage)
    }
}

/// Per-request accumulator mapping roles to identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSchema {
    refs: HashMap<Role, Vec<String>>,
}

impl ReferenceSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the identifier of a single-valued role.
    ///
    /// The first registration wins; multi-valued roles are ignored.
    pub fn put(&mut self, role: Role, id: impl Into<String>) {
        if !role.is_single() {
            return;
        }
        self.refs.entry(role).or_insert_with(|| vec![id.into()]);
    }

    /// Appends identifiers to a multi-valued role, keeping order and
    /// duplicates; single-valued roles are ignored.
    pub fn put_all<I, S>(&mut self, role: Role, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if role.is_single() {
            return;
        }
        let mut ids = ids.into_iter().map(Into::into).peekable();
        if ids.peek().is_none() {
            return;
        }
        self.refs.entry(role).or_default().extend(ids);
    }

    /// The identifier of a single-valued role.
    pub fn get(&self, role: Role) -> Option<&str> {
        if !role.is_single() {
            return None;
        }
        self.refs.get(&role)?.first().map(String::as_str)
    }

    /// The identifiers of a multi-valued role, in registration order.
    pub fn get_all(&self, role: Role) -> &[String] {
        if role.is_single() {
            return &[];
        }
        self.refs.get(&role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether any role holds an identifier.
    pub fn is_empty(&self) -> bool {
        self.refs.values().all(Vec::is_empty)
    }

    /// Every identifier across all roles, deduplicated, for the fetch call.
    pub fn flatten(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        Role::ALL
            .iter()
            .filter_map(|role| self.refs.get(role))
            .flatten()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}
