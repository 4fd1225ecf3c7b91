//! Overpass land-use oracle client
//!
//! Read-only tag lookup around a coordinate. The trait seam exists so the
//! verifier can be exercised against stub oracles; the verifier, not this
//! client, owns the fail-open mapping of errors to UNKNOWN.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Oracle errors. Every variant degrades to UNKNOWN in the verifier.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Oracle timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// A tag found near the queried coordinate, as a key/value pair.
pub type TagPair = (String, String);

/// Bounded-radius land-use tag lookup.
#[async_trait]
pub trait LandUseOracle: Send + Sync {
    /// Return all tags on ways within `radius_m` of the coordinate.
    async fn query(&self, latitude: f64, longitude: f64, radius_m: u32)
        -> Result<Vec<TagPair>, OracleError>;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
}

/// Overpass API client.
pub struct OverpassClient {
    http_client: reqwest::Client,
}

impl OverpassClient {
    pub fn new(timeout: Duration) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    fn build_query(latitude: f64, longitude: f64, radius_m: u32) -> String {
        format!(
            "[out:json];\n(\n  way(around:{radius_m}, {latitude}, {longitude})[\"landuse\"];\n  way(around:{radius_m}, {latitude}, {longitude})[\"industrial\"];\n  way(around:{radius_m}, {latitude}, {longitude})[\"natural\"=\"water\"];\n);\nout tags;"
        )
    }
}

#[async_trait]
impl LandUseOracle for OverpassClient {
    async fn query(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Result<Vec<TagPair>, OracleError> {
        let query = Self::build_query(latitude, longitude, radius_m);

        tracing::debug!(latitude, longitude, radius_m, "Querying land-use oracle");

        let response = self
            .http_client
            .get(OVERPASS_URL)
            .query(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Network(format!("HTTP {}", status.as_u16())));
        }

        let parsed: OverpassResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        let tags: Vec<TagPair> = parsed
            .elements
            .into_iter()
            .filter_map(|el| el.tags)
            .flat_map(|tags| tags.into_iter())
            .collect();

        tracing::debug!(tag_count = tags.len(), "Oracle responded");
        Ok(tags)
    }
}
