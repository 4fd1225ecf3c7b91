//! Detection normalization
//!
//! One explicit adapter per sensor family turns a raw string-keyed batch
//! into canonical [`Detection`]s. Adding a sensor means adding an adapter,
//! never branching on source strings downstream.
//!
//! Guarantees, regardless of adapter:
//! - intensity resolves through the fallback chain `frp` → `frp_mw` →
//!   `power`, defaulting to 0.0 when absent;
//! - non-finite numerics are coerced to 0.0 (data-quality sanitization —
//!   a conservative zero keeps the record auditable, dropping it would not);
//! - a corrupt field never aborts the batch; rows without a parseable
//!   coordinate are skipped with a warning;
//! - detections below the minimum confidence are dropped.

use crate::models::{Detection, SensorFamily};
use crate::services::feeds::RawBatch;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Intensity field-name fallback chain, in resolution order.
const FRP_FIELD_CHAIN: [&str; 3] = ["frp", "frp_mw", "power"];

/// Detections below this canonical confidence percent are dropped.
const MIN_CONFIDENCE_PERCENT: f64 = 30.0;

/// Produces canonical detections from one source's raw batch.
pub trait SourceAdapter: Send + Sync {
    /// Canonical source tag stamped on every produced detection
    fn source_tag(&self) -> &str;

    fn family(&self) -> SensorFamily;

    /// Normalize a raw batch. Infallible by design: bad rows are skipped,
    /// bad fields sanitized, and the worst case is an empty output.
    fn normalize(&self, batch: &RawBatch, observed_at: DateTime<Utc>) -> Vec<Detection>;
}

/// Coerce a raw field to a finite float. Missing, unparsable, NaN and
/// infinite values all become 0.0.
pub fn sanitize_float(raw: Option<&String>) -> f64 {
    let value = raw.and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(0.0);
    if value.is_finite() {
        value
    } else {
        tracing::warn!(raw = ?raw, "Non-finite numeric field sanitized to 0.0");
        0.0
    }
}

/// Resolve intensity through the documented field-name chain.
fn resolve_frp(row: &HashMap<String, String>) -> f64 {
    for field in FRP_FIELD_CHAIN {
        if let Some(raw) = row.get(field) {
            if !raw.trim().is_empty() {
                return sanitize_float(Some(raw));
            }
        }
    }
    0.0
}

/// Decode a confidence field to a canonical percent.
///
/// FIRMS encodes confidence two ways: MODIS as a numeric 0–100, VIIRS as a
/// category (`l`/`low`, `n`/`nominal`, `h`/`high`). An absent or
/// unrecognized value decodes to 0.0 and the row is dropped by the
/// confidence floor rather than guessed at.
pub fn decode_confidence(raw: Option<&String>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };

    match raw.trim().to_lowercase().as_str() {
        "l" | "low" => 10.0,
        "n" | "nominal" => 50.0,
        "h" | "high" => 90.0,
        other => {
            let value = other.parse::<f64>().unwrap_or(0.0);
            if value.is_finite() {
                value.clamp(0.0, 100.0)
            } else {
                0.0
            }
        }
    }
}

/// Parse a coordinate field. Unlike intensity, a coordinate cannot be
/// defaulted; `None` means the row is unusable.
fn parse_coord(row: &HashMap<String, String>, field: &str) -> Option<f64> {
    let value = row.get(field)?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

fn normalize_rows(
    batch: &RawBatch,
    source_tag: &str,
    family: SensorFamily,
    observed_at: DateTime<Utc>,
) -> Vec<Detection> {
    let mut detections = Vec::with_capacity(batch.rows.len());
    let mut skipped_coords = 0usize;
    let mut dropped_low_conf = 0usize;

    for row in &batch.rows {
        let (Some(latitude), Some(longitude)) =
            (parse_coord(row, "latitude"), parse_coord(row, "longitude"))
        else {
            skipped_coords += 1;
            continue;
        };

        let confidence = decode_confidence(row.get("confidence"));
        if confidence < MIN_CONFIDENCE_PERCENT {
            dropped_low_conf += 1;
            continue;
        }

        detections.push(Detection {
            source: source_tag.to_string(),
            family,
            latitude,
            longitude,
            frp_mw: resolve_frp(row).max(0.0),
            confidence,
            observed_at,
        });
    }

    if skipped_coords > 0 {
        tracing::warn!(source = source_tag, skipped = skipped_coords, "Rows without parseable coordinates skipped");
    }
    if dropped_low_conf > 0 {
        tracing::debug!(source = source_tag, dropped = dropped_low_conf, "Low-confidence rows dropped");
    }

    detections
}

/// Adapter for FIRMS polar products (VIIRS, MODIS). Fine geolocation.
pub struct FirmsAdapter {
    source_tag: String,
}

impl FirmsAdapter {
    pub fn new(source_tag: &str) -> Self {
        Self {
            source_tag: source_tag.to_string(),
        }
    }
}

impl SourceAdapter for FirmsAdapter {
    fn source_tag(&self) -> &str {
        &self.source_tag
    }

    fn family(&self) -> SensorFamily {
        SensorFamily::Fine
    }

    fn normalize(&self, batch: &RawBatch, observed_at: DateTime<Utc>) -> Vec<Detection> {
        normalize_rows(batch, &self.source_tag, SensorFamily::Fine, observed_at)
    }
}

/// Adapter for geostationary imager output. Coarse geolocation; the image
/// decoder upstream emits the same tabular shape the polar feeds use.
pub struct GeoAdapter {
    source_tag: String,
}

impl GeoAdapter {
    pub fn new(source_tag: &str) -> Self {
        Self {
            source_tag: source_tag.to_string(),
        }
    }
}

impl SourceAdapter for GeoAdapter {
    fn source_tag(&self) -> &str {
        &self.source_tag
    }

    fn family(&self) -> SensorFamily {
        SensorFamily::Coarse
    }

    fn normalize(&self, batch: &RawBatch, observed_at: DateTime<Utc>) -> Vec<Detection> {
        normalize_rows(batch, &self.source_tag, SensorFamily::Coarse, observed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn batch(rows: Vec<HashMap<String, String>>) -> RawBatch {
        RawBatch { rows }
    }

    #[test]
    fn normalizes_a_clean_row() {
        let adapter = FirmsAdapter::new("VIIRS_SNPP");
        let batch = batch(vec![row(&[
            ("latitude", "23.5"),
            ("longitude", "87.9"),
            ("frp", "12.4"),
            ("confidence", "nominal"),
        ])]);

        let detections = adapter.normalize(&batch, Utc::now());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].frp_mw, 12.4);
        assert_eq!(detections[0].confidence, 50.0);
        assert_eq!(detections[0].family, SensorFamily::Fine);
        assert_eq!(detections[0].source, "VIIRS_SNPP");
    }

    #[test]
    fn frp_fallback_chain() {
        // primary name absent, falls through to frp_mw, then power
        assert_eq!(
            resolve_frp(&row(&[("frp_mw", "7.5")])),
            7.5
        );
        assert_eq!(
            resolve_frp(&row(&[("power", "3.25")])),
            3.25
        );
        assert_eq!(resolve_frp(&row(&[("latitude", "1.0")])), 0.0);
    }

    #[test]
    fn non_finite_intensity_is_sanitized_not_dropped() {
        let adapter = FirmsAdapter::new("MODIS");
        let batch = batch(vec![row(&[
            ("latitude", "23.5"),
            ("longitude", "87.9"),
            ("frp", "NaN"),
            ("confidence", "80"),
        ])]);

        let detections = adapter.normalize(&batch, Utc::now());
        assert_eq!(detections.len(), 1, "sanitized row must survive");
        assert_eq!(detections[0].frp_mw, 0.0);
    }

    #[test]
    fn corrupt_row_does_not_abort_batch() {
        let adapter = FirmsAdapter::new("MODIS");
        let batch = batch(vec![
            row(&[("latitude", "garbage"), ("longitude", "87.9")]),
            row(&[
                ("latitude", "23.5"),
                ("longitude", "87.9"),
                ("frp", "4.0"),
                ("confidence", "h"),
            ]),
        ]);

        let detections = adapter.normalize(&batch, Utc::now());
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].latitude, 23.5);
    }

    #[test]
    fn low_confidence_rows_are_dropped() {
        let adapter = FirmsAdapter::new("VIIRS_SNPP");
        let batch = batch(vec![
            row(&[
                ("latitude", "23.5"),
                ("longitude", "87.9"),
                ("confidence", "l"),
            ]),
            row(&[
                ("latitude", "23.5"),
                ("longitude", "87.9"),
                ("confidence", "25"),
            ]),
        ]);

        assert!(adapter.normalize(&batch, Utc::now()).is_empty());
    }

    #[test]
    fn categorical_and_numeric_confidence_decode() {
        assert_eq!(decode_confidence(Some(&"h".to_string())), 90.0);
        assert_eq!(decode_confidence(Some(&"LOW".to_string())), 10.0);
        assert_eq!(decode_confidence(Some(&"85".to_string())), 85.0);
        assert_eq!(decode_confidence(Some(&"150".to_string())), 100.0);
        assert_eq!(decode_confidence(Some(&"inf".to_string())), 0.0);
        assert_eq!(decode_confidence(None), 0.0);
    }

    #[test]
    fn geo_adapter_is_coarse() {
        let adapter = GeoAdapter::new("GEO_IR");
        assert_eq!(adapter.family(), SensorFamily::Coarse);
        let batch = batch(vec![row(&[
            ("latitude", "24.0"),
            ("longitude", "86.0"),
            ("frp", "40.0"),
            ("confidence", "90"),
        ])]);
        let detections = adapter.normalize(&batch, Utc::now());
        assert_eq!(detections[0].family, SensorFamily::Coarse);
    }
}
