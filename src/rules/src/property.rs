//! Property-based rules.
//!
//! `PropertyEq` narrows the AQL query itself. `PropertyNeq` cannot: an AQL
//! `$ne` on `property.value` also drops items without the property at all,
//! so the protected records are subtracted after retrieval instead.

use async_trait::async_trait;

use crate::artifact::{ArtifactRecord, CandidateSet};
use crate::error::RuleError;
use crate::fragment::{FragmentSequence, PROPERTY_KEY_FIELD, PROPERTY_VALUE_FIELD, QueryFragment};
use crate::rule::Rule;
use crate::store::ArtifactStore;

/// Only artifacts currently carrying `key=value` are candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEq {
    key: String,
    value: String,
}

impl PropertyEq {
    pub const NAME: &'static str = "PropertyEq";

    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[async_trait]
impl Rule for PropertyEq {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn contribute_query_fragment(
        &self,
        _store: &dyn ArtifactStore,
        fragments: &mut FragmentSequence,
    ) -> Result<(), RuleError> {
        fragments.push(QueryFragment::and(vec![
            QueryFragment::eq(PROPERTY_KEY_FIELD, self.key.as_str()),
            QueryFragment::eq(PROPERTY_VALUE_FIELD, self.value.as_str()),
        ]));
        Ok(())
    }
}

/// Delete artifacts unless they carry exactly `key=value`.
///
/// Artifacts without the property stay candidates. Protect a build with e.g.
/// `PropertyNeq::new("do_not_delete", 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNeq {
    key: String,
    value: String,
}

impl PropertyNeq {
    pub const NAME: &'static str = "PropertyNeq";

    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn is_protected(&self, record: &ArtifactRecord) -> bool {
        record.property(&self.key) == Some(self.value.as_str())
    }
}

#[async_trait]
impl Rule for PropertyNeq {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn post_filter(&self, candidates: &mut CandidateSet) {
        let removed = candidates.remove_where(|record| self.is_protected(record));
        if removed > 0 {
            log::info!(
                "Keeping {removed} artifacts marked {}={}",
                self.key,
                self.value
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockArtifactStore;
    use serde_json::json;

    fn record(name: &str, properties: &[(&str, &str)]) -> ArtifactRecord {
        properties
            .iter()
            .fold(ArtifactRecord::new("libs-release", ".", name), |r, (k, v)| {
                r.with_property(*k, *v)
            })
    }

    #[tokio::test]
    async fn test_property_eq_fragment() {
        let store = MockArtifactStore::new();
        let mut fragments = FragmentSequence::new();

        PropertyEq::new("env", "prod")
            .contribute_query_fragment(&store, &mut fragments)
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&fragments).unwrap(),
            json!([{"$and": [
                {"property.key": {"$eq": "env"}},
                {"property.value": {"$eq": "prod"}}
            ]}])
        );
    }

    #[test]
    fn test_values_coerced_to_strings() {
        assert_eq!(PropertyEq::new("build", 42).value(), "42");
        assert_eq!(PropertyNeq::new("do_not_delete", 1).value(), "1");
        assert_eq!(PropertyNeq::new("pinned", true).value(), "true");
    }

    #[test]
    fn test_property_eq_does_not_filter() {
        let mut candidates = CandidateSet::new(vec![record("a", &[("env", "dev")])]);
        PropertyEq::new("env", "prod").post_filter(&mut candidates);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_property_neq_removes_only_exact_matches() {
        let mut candidates = CandidateSet::new(vec![
            record("protected", &[("keep", "1")]),
            record("untagged", &[]),
            record("other-value", &[("keep", "0")]),
        ]);

        PropertyNeq::new("keep", "1").post_filter(&mut candidates);

        let names: Vec<_> = candidates.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["untagged", "other-value"]);
    }

    #[test]
    fn test_property_neq_is_exact_string_comparison() {
        let mut candidates = CandidateSet::new(vec![
            record("empty", &[("keep", "")]),
            record("padded", &[("keep", " 1")]),
            record("wildcard", &[("keep", "*")]),
            record("case", &[("KEEP", "1")]),
        ]);

        PropertyNeq::new("keep", "1").post_filter(&mut candidates);
        assert_eq!(candidates.len(), 4);

        PropertyNeq::new("keep", "").post_filter(&mut candidates);
        let names: Vec<_> = candidates.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["padded", "wildcard", "case"]);
    }

    #[test]
    fn test_property_neq_is_idempotent() {
        let rule = PropertyNeq::new("do_not_delete", "1");
        let mut candidates = CandidateSet::new(vec![
            record("a", &[("do_not_delete", "1")]),
            record("b", &[]),
            record("c", &[("do_not_delete", "1"), ("env", "prod")]),
            record("d", &[("env", "prod")]),
        ]);

        rule.post_filter(&mut candidates);
        let once = candidates.clone();
        rule.post_filter(&mut candidates);

        assert_eq!(candidates, once);
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn test_property_neq_adds_no_fragment() {
        let store = MockArtifactStore::new();
        let mut fragments = FragmentSequence::new();

        PropertyNeq::new("keep", "1")
            .contribute_query_fragment(&store, &mut fragments)
            .await
            .unwrap();

        assert!(fragments.is_empty());
    }
}
