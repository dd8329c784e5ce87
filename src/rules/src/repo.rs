//! Repository scoping rules.

use async_trait::async_trait;

use crate::error::{PolicyError, RuleError};
use crate::fragment::{FragmentSequence, QueryFragment, REPO_FIELD};
use crate::rule::Rule;
use crate::store::ArtifactStore;

/// Characters reserved for mask and path syntax
pub const RESERVED_REPO_CHARS: [char; 4] = ['*', '/', '[', ']'];

/// Apply the policy to exactly one repository.
///
/// The repository must exist: it is checked against the store every time the
/// rule contributes its fragment, and a failed check stops the run instead of
/// silently widening the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    name: String,
}

impl Repo {
    pub const NAME: &'static str = "Repo";

    pub fn new(name: impl Into<String>) -> Result<Self, PolicyError> {
        let name = name.into();
        let invalid: Vec<char> = name
            .chars()
            .filter(|c| RESERVED_REPO_CHARS.contains(c))
            .collect();
        if !invalid.is_empty() {
            return Err(PolicyError::InvalidRepositoryName { name, invalid });
        }
        Ok(Self { name })
    }

    pub fn repository(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Rule for Repo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn contribute_query_fragment(
        &self,
        store: &dyn ArtifactStore,
        fragments: &mut FragmentSequence,
    ) -> Result<(), RuleError> {
        log::info!("Checking the existence of the {} repository", self.name);
        store
            .check_repository(&self.name)
            .await
            .map_err(|source| RuleError::RepositoryCheck {
                repo: self.name.clone(),
                source,
            })?;
        log::debug!("The {} repository exists", self.name);

        fragments.push(QueryFragment::eq(REPO_FIELD, self.name.as_str()));
        Ok(())
    }
}

/// Apply the policy to every repository matching a wildcard mask.
///
/// A mask may match no repository at all, so nothing is checked up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoByMask {
    mask: String,
}

impl RepoByMask {
    pub const NAME: &'static str = "RepoByMask";

    pub fn new(mask: impl Into<String>) -> Self {
        Self { mask: mask.into() }
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }
}

#[async_trait]
impl Rule for RepoByMask {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn contribute_query_fragment(
        &self,
        _store: &dyn ArtifactStore,
        fragments: &mut FragmentSequence,
    ) -> Result<(), RuleError> {
        log::info!("Get from {}", self.mask);
        fragments.push(QueryFragment::matches(REPO_FIELD, self.mask.as_str()));
        Ok(())
    }
}
