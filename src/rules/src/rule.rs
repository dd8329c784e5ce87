use std::fmt;

use async_trait::async_trait;

use crate::artifact::CandidateSet;
use crate::error::RuleError;
use crate::fragment::FragmentSequence;
use crate::store::ArtifactStore;

/// A retention rule.
///
/// Both phases have no-op defaults, so a rule implements only the phase it
/// takes part in. Rules hold no state that changes between calls and can be
/// reused across runs.
#[async_trait]
pub trait Rule: fmt::Debug + Send + Sync {
    /// Canonical rule type name as used in policy configuration
    fn name(&self) -> &'static str;

    /// Append this rule's server-side filter, if any
    async fn contribute_query_fragment(
        &self,
        _store: &dyn ArtifactStore,
        _fragments: &mut FragmentSequence,
    ) -> Result<(), RuleError> {
        Ok(())
    }

    /// Remove records this rule protects from deletion
    fn post_filter(&self, _candidates: &mut CandidateSet) {}
}
