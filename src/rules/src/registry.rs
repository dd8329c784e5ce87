//! Build rules and policies from configuration.
//!
//! Rule type names are resolved here and only here, including the old
//! lowercase spellings kept for existing configuration files.

use common::config::{PolicyConfig, RuleDefinition};

use crate::error::PolicyError;
use crate::policy::CleanupPolicy;
use crate::property::{PropertyEq, PropertyNeq};
use crate::repo::{Repo, RepoByMask};
use crate::rule::Rule;

/// Canonical rule type names
pub const RULE_NAMES: [&str; 4] = [
    Repo::NAME,
    RepoByMask::NAME,
    PropertyEq::NAME,
    PropertyNeq::NAME,
];

/// Deprecated spelling -> canonical name
pub const DEPRECATED_ALIASES: [(&str, &str); 4] = [
    ("repo", Repo::NAME),
    ("repo_by_mask", RepoByMask::NAME),
    ("property_eq", PropertyEq::NAME),
    ("property_neq", PropertyNeq::NAME),
];

/// Resolve a configured rule type to its canonical name
pub fn canonical_rule_name(name: &str) -> Result<&'static str, PolicyError> {
    if let Some(canonical) = RULE_NAMES.iter().find(|n| **n == name) {
        return Ok(*canonical);
    }
    if let Some((alias, canonical)) = DEPRECATED_ALIASES.iter().find(|(a, _)| *a == name) {
        log::warn!("Rule name `{alias}` is deprecated, use `{canonical}` instead");
        return Ok(*canonical);
    }
    Err(PolicyError::UnknownRule(name.to_string()))
}

fn required<'a, T>(
    value: Option<&'a T>,
    rule: &'static str,
    argument: &'static str,
) -> Result<&'a T, PolicyError>
where
    T: ?Sized,
{
    value.ok_or(PolicyError::MissingArgument { rule, argument })
}

/// Construct one rule, validating its arguments
pub fn build_rule(definition: &RuleDefinition) -> Result<Box<dyn Rule>, PolicyError> {
    let rule = canonical_rule_name(&definition.rule)?;
    let built: Box<dyn Rule> = match rule {
        Repo::NAME => {
            let name = required(definition.name.as_deref(), rule, "name")?;
            Box::new(Repo::new(name)?)
        }
        RepoByMask::NAME => {
            let mask = required(definition.mask.as_deref(), rule, "mask")?;
            Box::new(RepoByMask::new(mask))
        }
        PropertyEq::NAME => {
            let key = required(definition.key.as_deref(), rule, "key")?;
            let value = required(definition.value.as_ref(), rule, "value")?;
            Box::new(PropertyEq::new(key, value))
        }
        PropertyNeq::NAME => {
            let key = required(definition.key.as_deref(), rule, "key")?;
            let value = required(definition.value.as_ref(), rule, "value")?;
            Box::new(PropertyNeq::new(key, value))
        }
        other => return Err(PolicyError::UnknownRule(other.to_string())),
    };
    Ok(built)
}

/// Construct a policy; any invalid rule keeps the whole policy from being built
pub fn build_policy(config: &PolicyConfig) -> Result<CleanupPolicy, PolicyError> {
    let rules = config
        .rules
        .iter()
        .map(build_rule)
        .collect::<Result<Vec<_>, _>>()?;
    CleanupPolicy::new(config.name.as_str(), rules)
}
