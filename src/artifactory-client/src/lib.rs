mod aql;
mod client;

pub use aql::decode_results;
pub use client::{API_KEY_HEADER, ArtifactoryClient};
