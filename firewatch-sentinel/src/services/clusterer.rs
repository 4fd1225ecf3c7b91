//! In-cycle spatial clustering
//!
//! Detections from one cycle are snapped to a fixed ~1 km grid (0.01°) and
//! grouped per (cell, source). Within a cell the centroid is the mean of
//! member coordinates and intensity is the SUM of member intensities:
//! adjacent pixels over one anomaly report additive radiative power, not
//! repeated measurements of the same value.
//!
//! Grouping is per source tag: two satellites seeing the same fire are two
//! corroborating observations, and summing across them would double-count
//! the physical emission. Cross-source fusion happens at the event level
//! in the matcher instead.
//!
//! Known accepted limitation at this resolution: one fire straddling a
//! cell boundary can split into two clusters, and two adjacent fires can
//! merge into one.

use crate::models::{Cluster, Detection};
use std::collections::BTreeMap;

/// Grid pitch in degrees, ~1.1 km of latitude.
const GRID_DEG: f64 = 0.01;

fn grid_cell(value: f64) -> i64 {
    (value / GRID_DEG).floor() as i64
}

/// Cluster one cycle's detections. Output order is stable for a given
/// input: cells are iterated in sorted (lat cell, lon cell, source) order.
pub fn cluster(detections: &[Detection]) -> Vec<Cluster> {
    let mut cells: BTreeMap<(i64, i64, String), Vec<&Detection>> = BTreeMap::new();

    for detection in detections {
        let key = (
            grid_cell(detection.latitude),
            grid_cell(detection.longitude),
            detection.source.clone(),
        );
        cells.entry(key).or_default().push(detection);
    }

    cells
        .into_values()
        .map(|members| {
            let count = members.len();
            let lat_sum: f64 = members.iter().map(|d| d.latitude).sum();
            let lon_sum: f64 = members.iter().map(|d| d.longitude).sum();
            let frp_sum: f64 = members.iter().map(|d| d.frp_mw).sum();
            let confidence = members
                .iter()
                .map(|d| d.confidence)
                .fold(0.0f64, f64::max);

            Cluster {
                latitude: lat_sum / count as f64,
                longitude: lon_sum / count as f64,
                frp_mw: frp_sum,
                member_count: count,
                source: members[0].source.clone(),
                family: members[0].family,
                confidence,
            }
        })
        .collect()
}
