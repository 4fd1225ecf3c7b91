//! Hotspot feed retrieval
//!
//! One [`FeedSource`] per upstream satellite product. Sources are fetched
//! concurrently by the pipeline and each carries its own timeout; one
//! unreachable or malformed source is skipped for the cycle while the
//! others proceed independently.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Feed retrieval errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Feed timed out")]
    Timeout,

    #[error("Malformed batch: {0}")]
    Malformed(String),
}

/// One raw tabular batch from a single source: string-keyed rows with the
/// upstream's own column names. Normalization happens downstream in the
/// source adapter.
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    pub rows: Vec<HashMap<String, String>>,
}

/// A pollable hotspot source.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Canonical source tag, e.g. "VIIRS_SNPP"
    fn source_tag(&self) -> &str;

    /// Fetch the current batch. Implementations carry their own network
    /// timeout; the pipeline additionally bounds the whole call.
    async fn fetch(&self) -> Result<RawBatch, FeedError>;
}

const FIRMS_BASE_URL: &str = "https://firms.modaps.eosdis.nasa.gov/api/area/csv";

/// FIRMS area-CSV client for one polar satellite product.
pub struct FirmsFeed {
    http_client: reqwest::Client,
    source_tag: String,
    /// FIRMS product name in the URL path, e.g. "VIIRS_SNPP_NRT"
    product: String,
    api_key: String,
    /// "west,south,east,north" degree box
    area_bbox: String,
}

impl FirmsFeed {
    pub fn new(
        source_tag: &str,
        product: &str,
        api_key: &str,
        area_bbox: &str,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            source_tag: source_tag.to_string(),
            product: product.to_string(),
            api_key: api_key.to_string(),
            area_bbox: area_bbox.to_string(),
        })
    }
}

#[async_trait]
impl FeedSource for FirmsFeed {
    fn source_tag(&self) -> &str {
        &self.source_tag
    }

    async fn fetch(&self) -> Result<RawBatch, FeedError> {
        // Trailing /1 = last 1 day of detections
        let url = format!(
            "{}/{}/{}/{}/1",
            FIRMS_BASE_URL, self.api_key, self.product, self.area_bbox
        );

        tracing::debug!(source = %self.source_tag, product = %self.product, "Fetching FIRMS batch");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout
                } else {
                    FeedError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Network(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let batch = parse_csv_batch(&body)?;
        tracing::info!(source = %self.source_tag, rows = batch.rows.len(), "Feed batch received");
        Ok(batch)
    }
}

/// Decode a FIRMS area CSV into string-keyed rows. Headers are lower-cased
/// so adapters match columns case-insensitively. FIRMS CSV is unquoted, so
/// a plain comma split is exact here.
pub fn parse_csv_batch(body: &str) -> Result<RawBatch, FeedError> {
    let mut lines = body.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| FeedError::Malformed("empty response body".to_string()))?;
    let headers: Vec<String> = header_line
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();

    if !headers.iter().any(|h| h == "latitude") {
        return Err(FeedError::Malformed(format!(
            "missing latitude column, got: {}",
            header_line
        )));
    }

    let mut rows = Vec::new();
    for line in lines {
        let values: Vec<&str> = line.split(',').collect();
        // Short rows are padded with empties by zip; extra cells are dropped
        let row: HashMap<String, String> = headers
            .iter()
            .zip(values.iter().chain(std::iter::repeat(&"")))
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();
        rows.push(row);
    }

    Ok(RawBatch { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_firms_csv() {
        let body = "latitude,longitude,frp,confidence\n23.5,87.9,12.4,nominal\n23.6,87.8,8.1,h\n";
        let batch = parse_csv_batch(body).unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[0]["latitude"], "23.5");
        assert_eq!(batch.rows[1]["confidence"], "h");
    }

    #[test]
    fn headers_are_lowercased() {
        let body = "Latitude,Longitude,FRP\n22.0,88.0,5.0\n";
        let batch = parse_csv_batch(body).unwrap();
        assert_eq!(batch.rows[0]["frp"], "5.0");
    }

    #[test]
    fn short_rows_are_padded() {
        let body = "latitude,longitude,frp\n22.0,88.0\n";
        let batch = parse_csv_batch(body).unwrap();
        assert_eq!(batch.rows[0]["frp"], "");
    }

    #[test]
    fn missing_latitude_column_is_malformed() {
        let body = "lat,lon\n22.0,88.0\n";
        assert!(matches!(
            parse_csv_batch(body),
            Err(FeedError::Malformed(_))
        ));
    }

    #[test]
    fn empty_body_is_malformed() {
        assert!(matches!(parse_csv_batch(""), Err(FeedError::Malformed(_))));
    }
}
