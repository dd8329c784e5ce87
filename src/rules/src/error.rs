use crate::store::StoreError;

/// Invalid rule or policy arguments, raised while the policy is being built
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Bad name for repo: {name}, contains reserved symbols: '{}'", .invalid.iter().collect::<String>())]
    InvalidRepositoryName { name: String, invalid: Vec<char> },
    #[error("Policy name cannot be empty")]
    EmptyPolicyName,
    #[error("Policy {0} has no rules")]
    NoRules(String),
    #[error("Unknown rule type: {0}")]
    UnknownRule(String),
    #[error("Rule {rule} requires argument `{argument}`")]
    MissingArgument {
        rule: &'static str,
        argument: &'static str,
    },
}

/// Failure while a rule contributes to a cleanup run
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("The {repo} repository does not exist or could not be checked")]
    RepositoryCheck {
        repo: String,
        #[source]
        source: StoreError,
    },
}

/// Any failure of a cleanup run, surfaced to the caller that started it
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error("AQL query for policy {policy} failed")]
    Query {
        policy: String,
        #[source]
        source: StoreError,
    },
}
