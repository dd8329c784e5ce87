//! Two-phase composition of rules into a cleanup decision.

use std::fmt;

use crate::artifact::CandidateSet;
use crate::error::{CleanupError, PolicyError};
use crate::fragment::{FragmentSequence, QueryFragment};
use crate::rule::Rule;
use crate::store::ArtifactStore;

/// Item domains requested unless the caller overrides them
pub const DEFAULT_INCLUDE: [&str; 2] = ["*", "property"];

/// A composite `items.find(...)` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AqlQuery {
    filter: QueryFragment,
    include: Vec<String>,
}

impl AqlQuery {
    pub fn new(filter: QueryFragment) -> Self {
        Self {
            filter,
            include: DEFAULT_INCLUDE.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn filter(&self) -> &QueryFragment {
        &self.filter
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }
}

/// Renders the AQL request body, e.g.
/// `items.find({"$and":[{"repo":{"$eq":"libs"}}]}).include("*","property")`
impl fmt::Display for AqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = serde_json::to_string(&self.filter).map_err(|_| fmt::Error)?;
        write!(f, "items.find({filter})")?;
        if !self.include.is_empty() {
            let fields = self
                .include
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| fmt::Error)?;
            write!(f, ".include({})", fields.join(","))?;
        }
        Ok(())
    }
}

/// A named, ordered set of rules.
///
/// Rules run in declaration order in both phases. Several repository rules in
/// one policy are simply ANDed; whether that combination matches anything is
/// up to whoever wrote the policy.
#[derive(Debug)]
pub struct CleanupPolicy {
    name: String,
    rules: Vec<Box<dyn Rule>>,
    include: Option<Vec<String>>,
}

impl CleanupPolicy {
    pub fn new(name: impl Into<String>, rules: Vec<Box<dyn Rule>>) -> Result<Self, PolicyError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PolicyError::EmptyPolicyName);
        }
        if rules.is_empty() {
            return Err(PolicyError::NoRules(name));
        }
        Ok(Self {
            name,
            rules,
            include: None,
        })
    }

    /// Override the item domains requested by the query
    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = Some(include);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Phase one: collect every rule's fragment into one query
    pub async fn build_query(&self, store: &dyn ArtifactStore) -> Result<AqlQuery, CleanupError> {
        let mut fragments = FragmentSequence::new();
        for rule in &self.rules {
            let before = fragments.len();
            rule.contribute_query_fragment(store, &mut fragments).await?;
            log::debug!(
                "Policy {}: rule {} added {} fragments",
                self.name,
                rule.name(),
                fragments.len() - before
            );
        }

        if fragments.is_empty() {
            log::warn!(
                "Policy {} has no server-side filter, the query spans every repository",
                self.name
            );
        }

        let query = AqlQuery::new(fragments.into_conjunction());
        Ok(match &self.include {
            Some(include) => query.with_include(include.clone()),
            None => query,
        })
    }

    /// Phase two: let every rule remove the records it protects
    pub fn post_filter(&self, candidates: &mut CandidateSet) {
        for rule in &self.rules {
            let before = candidates.len();
            rule.post_filter(candidates);
            log::debug!(
                "Policy {}: rule {} removed {} candidates",
                self.name,
                rule.name(),
                before - candidates.len()
            );
        }
    }

    /// Run both phases, keeping the query that was sent
    pub async fn execute(&self, store: &dyn ArtifactStore) -> Result<PolicyOutcome, CleanupError> {
        let query = self.build_query(store).await?;
        log::info!("Policy {}: {}", self.name, query);

        let records = store
            .find_items(&query)
            .await
            .map_err(|source| CleanupError::Query {
                policy: self.name.clone(),
                source,
            })?;
        log::info!("Policy {}: {} artifacts found", self.name, records.len());

        let mut candidates = CandidateSet::new(records);
        self.post_filter(&mut candidates);
        log::info!(
            "Policy {}: {} artifacts eligible for deletion",
            self.name,
            candidates.len()
        );
        Ok(PolicyOutcome { query, candidates })
    }

    /// Run both phases and return the artifacts eligible for deletion
    pub async fn candidates(&self, store: &dyn ArtifactStore) -> Result<CandidateSet, CleanupError> {
        Ok(self.execute(store).await?.candidates)
    }
}

/// Result of one policy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub query: AqlQuery,
    pub candidates: CandidateSet,
}
