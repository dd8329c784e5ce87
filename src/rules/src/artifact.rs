//! Artifact records returned by the store and the candidate set they form.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Record does not match the shape post-filters rely on
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Artifact record is not a JSON object")]
    NotAnObject,
    #[error("Artifact record is missing field `{0}`")]
    MissingField(&'static str),
    #[error("Artifact record {0} has no properties mapping")]
    MissingProperties(String),
    #[error("Artifact record {record}: property `{key}` is not a string")]
    NonStringProperty { record: String, key: String },
}

/// One item as returned by the store.
///
/// `properties` keeps absence of a key distinct from an empty value. Fields
/// other than the identifying ones are carried in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub repo: String,
    pub path: String,
    pub name: String,
    pub properties: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtifactRecord {
    pub fn new(repo: impl Into<String>, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            path: path.into(),
            name: name.into(),
            properties: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// `repo/path/name`, with the root path `.` left out
    pub fn full_path(&self) -> String {
        if self.path.is_empty() || self.path == "." {
            format!("{}/{}", self.repo, self.name)
        } else {
            format!("{}/{}/{}", self.repo, self.path, self.name)
        }
    }
}

fn take_string(object: &mut Map<String, Value>, field: &'static str) -> Result<String, RecordError> {
    match object.remove(field) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(RecordError::MissingField(field)),
    }
}

impl TryFrom<Value> for ArtifactRecord {
    type Error = RecordError;

    /// Decode a record whose `properties` is already a string mapping
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut object) = value else {
            return Err(RecordError::NotAnObject);
        };

        let repo = take_string(&mut object, "repo")?;
        let path = take_string(&mut object, "path")?;
        let name = take_string(&mut object, "name")?;
        let mut record = ArtifactRecord::new(repo, path, name);

        let Some(Value::Object(properties)) = object.remove("properties") else {
            return Err(RecordError::MissingProperties(record.full_path()));
        };
        for (key, value) in properties {
            match value {
                Value::String(v) => {
                    record.properties.insert(key, v);
                }
                _ => {
                    return Err(RecordError::NonStringProperty {
                        record: record.full_path(),
                        key,
                    });
                }
            }
        }

        record.extra = object;
        Ok(record)
    }
}

/// Ordered records currently slated for deletion.
///
/// Rules receive `&mut CandidateSet`; the only mutation offered is removal,
/// so nothing downstream of the query can add artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateSet {
    records: Vec<ArtifactRecord>,
}

impl CandidateSet {
    pub fn new(records: Vec<ArtifactRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArtifactRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[ArtifactRecord] {
        &self.records
    }

    /// Drop every record matching `predicate`, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ArtifactRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|record| !predicate(record));
        before - self.records.len()
    }

    pub fn into_vec(self) -> Vec<ArtifactRecord> {
        self.records
    }
}

impl From<Vec<ArtifactRecord>> for CandidateSet {
    fn from(records: Vec<ArtifactRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<ArtifactRecord> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = ArtifactRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a ArtifactRecord;
    type IntoIter = std::slice::Iter<'a, ArtifactRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for CandidateSet {
    type Item = ArtifactRecord;
    type IntoIter = std::vec::IntoIter<ArtifactRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
