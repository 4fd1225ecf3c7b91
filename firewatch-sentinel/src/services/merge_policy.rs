//! Merge reconciliation rules
//!
//! Pure field-level policy applied when a candidate matches a stored
//! event. What changes and what never changes is the contract:
//! - `last_seen` advances to the cycle timestamp
//! - `frp_mw` takes the max of stored and candidate (never decreases;
//!   a zero-FRP corroboration must not erase a good reading)
//! - `source` gains the candidate tag if not already present (exact tag
//!   comparison, never substring)
//! - `alert_count` increments by exactly 1
//! - `first_seen`, latitude and longitude are never touched

use crate::models::{EventCandidate, FireEvent};
use chrono::{DateTime, Utc};

/// Partial update produced by a merge, applied via the store's patch op.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPatch {
    pub last_seen: DateTime<Utc>,
    pub frp_mw: f64,
    pub source: String,
    pub alert_count: i64,
}

/// Add `tag` to a ", "-joined union string unless an identical tag is
/// already present.
pub fn union_source(existing: &str, tag: &str) -> String {
    let already_present = existing
        .split(", ")
        .any(|existing_tag| existing_tag == tag);

    if already_present || tag.is_empty() {
        existing.to_string()
    } else if existing.is_empty() {
        tag.to_string()
    } else {
        format!("{}, {}", existing, tag)
    }
}

/// Reconcile a matched candidate against the stored event.
pub fn reconcile(existing: &FireEvent, candidate: &EventCandidate, now: DateTime<Utc>) -> EventPatch {
    EventPatch {
        last_seen: now,
        frp_mw: existing.frp_mw.max(candidate.frp_mw),
        source: union_source(&existing.source, &candidate.source),
        alert_count: existing.alert_count + 1,
    }
}
