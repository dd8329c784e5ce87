//! Test support for code driving cleanup policies.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::artifact::ArtifactRecord;
use crate::policy::AqlQuery;
use crate::store::{ArtifactStore, StoreError};

/// Store fake with a fixed repository list and a fixed query result.
///
/// Queries are not evaluated: every `find_items` call returns the configured
/// records, and both kinds of call are recorded for assertions.
///
/// ```rust,ignore
/// let store = InMemoryStore::new()
///     .with_repository("libs-release")
///     .with_items(vec![ArtifactRecord::new("libs-release", ".", "a.jar")]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    repositories: BTreeSet<String>,
    items: Vec<ArtifactRecord>,
    checked: Mutex<Vec<String>>,
    queries: Mutex<Vec<AqlQuery>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(mut self, name: impl Into<String>) -> Self {
        self.repositories.insert(name.into());
        self
    }

    pub fn with_items(mut self, items: Vec<ArtifactRecord>) -> Self {
        self.items = items;
        self
    }

    /// Repository names passed to `check_repository`, in call order
    pub fn checked_repositories(&self) -> Vec<String> {
        lock(&self.checked).clone()
    }

    /// Queries passed to `find_items`, in call order
    pub fn executed_queries(&self) -> Vec<AqlQuery> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryStore {
    async fn check_repository(&self, repo: &str) -> Result<(), StoreError> {
        lock(&self.checked).push(repo.to_string());
        if self.repositories.contains(repo) {
            Ok(())
        } else {
            Err(StoreError::Api {
                status: 404,
                message: format!("Unable to find item: {repo}"),
            })
        }
    }

    async fn find_items(&self, query: &AqlQuery) -> Result<Vec<ArtifactRecord>, StoreError> {
        lock(&self.queries).push(query.clone());
        Ok(self.items.clone())
    }
}
