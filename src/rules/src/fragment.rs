//! AQL filter fragments.
//!
//! Field names and operator spellings are part of the AQL wire format and
//! serialize exactly as Artifactory expects them.

use serde::ser::{Serialize, SerializeMap, Serializer};

pub const REPO_FIELD: &str = "repo";
pub const PROPERTY_KEY_FIELD: &str = "property.key";
pub const PROPERTY_VALUE_FIELD: &str = "property.value";

/// Comparison applied to a single field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Criterion {
    /// `{"$eq": value}`
    Eq(String),
    /// `{"$match": mask}`, `*` and `?` wildcards
    Match(String),
}

impl Serialize for Criterion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Criterion::Eq(value) => map.serialize_entry("$eq", value)?,
            Criterion::Match(mask) => map.serialize_entry("$match", mask)?,
        }
        map.end()
    }
}

/// One predicate contributed by a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryFragment {
    /// `{field: criterion}`
    Field { field: String, criterion: Criterion },
    /// `{"$and": [...]}`
    And(Vec<QueryFragment>),
}

impl QueryFragment {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        QueryFragment::Field {
            field: field.into(),
            criterion: Criterion::Eq(value.into()),
        }
    }

    pub fn matches(field: impl Into<String>, mask: impl Into<String>) -> Self {
        QueryFragment::Field {
            field: field.into(),
            criterion: Criterion::Match(mask.into()),
        }
    }

    pub fn and(fragments: Vec<QueryFragment>) -> Self {
        QueryFragment::And(fragments)
    }
}

impl Serialize for QueryFragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            QueryFragment::Field { field, criterion } => map.serialize_entry(field, criterion)?,
            QueryFragment::And(fragments) => map.serialize_entry("$and", fragments)?,
        }
        map.end()
    }
}

/// Fragments accumulated across all rules of one query build.
///
/// Append-only; the composite query is the conjunction of every entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct FragmentSequence {
    fragments: Vec<QueryFragment>,
}

impl FragmentSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: QueryFragment) {
        self.fragments.push(fragment);
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryFragment> {
        self.fragments.iter()
    }

    pub fn as_slice(&self) -> &[QueryFragment] {
        &self.fragments
    }

    /// Wrap the sequence as the top-level `$and`
    pub fn into_conjunction(self) -> QueryFragment {
        QueryFragment::And(self.fragments)
    }
}
