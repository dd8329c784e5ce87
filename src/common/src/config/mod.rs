use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Name of the configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "artifact-cleanup.toml";

/// Prefix for environment variable overrides, e.g. `ARTIFACT_CLEANUP__ARTIFACTORY__URL`
pub const ENV_PREFIX: &str = "ARTIFACT_CLEANUP__";

/// Connection settings for the Artifactory instance being cleaned
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactoryConfig {
    /// Base URL including the context path, e.g. `https://repo.example.com/artifactory`
    pub url: String,
    /// API key sent as `X-JFrog-Art-Api`; the session is otherwise anonymous
    pub api_key: Option<String>,
    /// Per-request timeout applied by the HTTP client
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Item domains requested through `.include(...)` in the AQL request
    pub include: Vec<String>,
}

impl Default for ArtifactoryConfig {
    fn default() -> Self {
        Self {
            url: String::from("http://localhost:8082/artifactory"),
            api_key: None,
            timeout: Duration::from_secs(30),
            include: vec![String::from("*"), String::from("property")],
        }
    }
}

/// Scalar rule argument as it appears in TOML or the environment.
///
/// Environment overrides are parsed by figment, so `1` arrives as an integer
/// even when the rule compares strings. Rules receive the canonical string
/// form produced by `Display`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::String(s) => f.write_str(s),
            ScalarValue::Integer(i) => write!(f, "{i}"),
            // keep the fractional part: `1.0` must not compare equal to `1`
            ScalarValue::Float(v) => write!(f, "{v:?}"),
            ScalarValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// One rule entry of a policy, resolved by the rule registry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Rule type name (`Repo`, `RepoByMask`, `PropertyEq`, `PropertyNeq`)
    pub rule: String,
    /// Repository name for `Repo`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Repository mask for `RepoByMask`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    /// Property key for the property rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Property value for the property rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ScalarValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Remote store connection
    pub artifactory: ArtifactoryConfig,
    /// Cleanup policies in declaration order
    #[serde(default)]
    pub policies: Vec<PolicyConfig>,
}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(DEFAULT_CONFIG_FILE))
            .extract()
            .map_err(Box::new)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(Toml::file(path)).extract().map_err(Box::new)
    }

    fn figment(file: figment::providers::Data<Toml>) -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn policy(&self, name: &str) -> Option<&PolicyConfig> {
        self.policies.iter().find(|p| p.name == name)
    }
}
