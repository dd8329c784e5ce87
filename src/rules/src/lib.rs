//! Composable retention rules for Artifactory cleanup.
//!
//! A [`CleanupPolicy`] runs in two phases. Rules first contribute AQL
//! fragments which are ANDed into a single `items.find(...)` request; the
//! returned records then pass through every rule's client-side post-filter.

pub mod artifact;
pub mod error;
pub mod fragment;
pub mod policy;
pub mod property;
pub mod registry;
pub mod repo;
pub mod rule;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use artifact::{ArtifactRecord, CandidateSet, RecordError};
pub use error::{CleanupError, PolicyError, RuleError};
pub use fragment::{Criterion, FragmentSequence, QueryFragment};
pub use policy::{AqlQuery, CleanupPolicy, PolicyOutcome};
pub use property::{PropertyEq, PropertyNeq};
pub use repo::{Repo, RepoByMask};
pub use rule::Rule;
pub use store::{ArtifactStore, StoreError};
