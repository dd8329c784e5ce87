//! Decoding of `/api/search/aql` responses.

use rules::{ArtifactRecord, StoreError};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct AqlResponse {
    results: Vec<Map<String, Value>>,
}

/// AQL returns properties as a list of key/value pairs
#[derive(Debug, Deserialize)]
struct AqlProperty {
    key: String,
    #[serde(default)]
    value: Option<String>,
}

/// Decode an AQL response body into artifact records.
///
/// Items without properties come back without a `properties` list and get an
/// empty mapping. A property without a value maps to an empty string; when a
/// key repeats, the last value wins.
pub fn decode_results(body: &str) -> Result<Vec<ArtifactRecord>, StoreError> {
    let response: AqlResponse = serde_json::from_str(body)?;
    response.results.into_iter().map(into_record).collect()
}

fn into_record(mut item: Map<String, Value>) -> Result<ArtifactRecord, StoreError> {
    let properties = match item.remove("properties") {
        Some(list) => serde_json::from_value::<Vec<AqlProperty>>(list)?,
        None => Vec::new(),
    };
    let mapping: Map<String, Value> = properties
        .into_iter()
        .map(|p| (p.key, Value::String(p.value.unwrap_or_default())))
        .collect();
    item.insert("properties".to_string(), Value::Object(mapping));

    Ok(ArtifactRecord::try_from(Value::Object(item))?)
}
