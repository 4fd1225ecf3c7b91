//! Event matching: idempotent upsert against the persistent store
//!
//! Prevents the same physical fire from creating a new record (and a new
//! alert) on every polling cycle:
//! 1. Bounding-box pre-filter around the candidate, half-width set by the
//!    candidate's sensor family.
//! 2. Planar distance (degree delta × 111 km, adequate at these scales);
//!    the FIRST stored event within the family's limit wins. Greedy
//!    first-match is explicit policy: at most one plausible candidate is
//!    normally in range. Two genuinely distinct new fires inside one
//!    radius in the same cycle could fuse; an optimal-assignment matcher
//!    would replace `find_match` if that ever matters in practice.
//! 3. Match → merge patch via the merge policy. No match → insert.
//!
//! Race caveat: this is check-then-act with no store-side lock or
//! uniqueness constraint. Two pollers running the same cycle can both
//! miss and both insert. Accepted until the storage layer constrains it.

use crate::db;
use crate::models::{EventCandidate, FireEvent};
use crate::services::merge_policy::{self, EventPatch};
use chrono::{DateTime, Utc};
use firewatch_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// km per degree of latitude (and of longitude, approximated planar)
const KM_PER_DEGREE: f64 = 111.0;

/// Fraction of the pixel footprint assumed actively burning on insert.
const SUB_PIXEL_FRACTION: f64 = 0.15;

/// Outcome of one match-or-insert decision.
#[derive(Debug)]
pub enum MatchOutcome {
    /// No stored event in range; a new one was created
    Inserted(FireEvent),
    /// Candidate merged into an existing event
    Merged { id: Uuid, patch: EventPatch },
}

impl MatchOutcome {
    pub fn is_merge(&self) -> bool {
        matches!(self, MatchOutcome::Merged { .. })
    }
}

/// Planar approximation of great-circle distance, in km.
pub fn planar_distance_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let d_lat = lat_a - lat_b;
    let d_lon = lon_a - lon_b;
    (d_lat * d_lat + d_lon * d_lon).sqrt() * KM_PER_DEGREE
}

pub struct EventMatcher;

impl EventMatcher {
    pub fn new() -> Self {
        Self
    }

    /// First stored event within the candidate's match limit, if any.
    fn find_match<'a>(
        candidate: &EventCandidate,
        stored: &'a [FireEvent],
    ) -> Option<&'a FireEvent> {
        let limit_km = candidate.family.match_limit_km();
        stored.iter().find(|event| {
            planar_distance_km(event.latitude, event.longitude, candidate.latitude, candidate.longitude)
                < limit_km
        })
    }

    /// Match the candidate against the store and either merge or insert.
    pub async fn match_or_insert(
        &self,
        pool: &SqlitePool,
        candidate: &EventCandidate,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome> {
        let radius = candidate.family.search_radius_deg();
        let stored = db::events::find_in_box(
            pool,
            (candidate.latitude - radius)..=(candidate.latitude + radius),
            (candidate.longitude - radius)..=(candidate.longitude + radius),
        )
        .await?;

        if let Some(existing) = Self::find_match(candidate, &stored) {
            let patch = merge_policy::reconcile(existing, candidate, now);
            db::events::apply_merge(pool, existing.id, &patch).await?;

            tracing::info!(
                event_id = %existing.id,
                source = %candidate.source,
                frp_mw = patch.frp_mw,
                alert_count = patch.alert_count,
                "Merged detection into existing event"
            );

            return Ok(MatchOutcome::Merged {
                id: existing.id,
                patch,
            });
        }

        let event = FireEvent {
            id: Uuid::new_v4(),
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            first_seen: now,
            last_seen: now,
            source: candidate.source.clone(),
            alert_count: 1,
            frp_mw: candidate.frp_mw,
            confidence: candidate.confidence,
            est_area_m2: candidate.family.pixel_footprint_m2()
                * candidate.member_count as f64
                * SUB_PIXEL_FRACTION,
            zone: candidate.zone,
            land_type: candidate.land_type,
        };

        db::events::insert_event(pool, &event).await?;

        tracing::info!(
            event_id = %event.id,
            zone = event.zone.as_str(),
            frp_mw = event.frp_mw,
            "Inserted new fire event"
        );

        Ok(MatchOutcome::Inserted(event))
    }
}

impl Default for EventMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LandType, SensorFamily, Zone};

    #[test]
    fn planar_distance_sanity() {
        // one hundredth of a degree of latitude is ~1.11 km
        let d = planar_distance_km(22.00, 88.00, 22.01, 88.00);
        assert!((d - 1.11).abs() < 0.01);
        assert_eq!(planar_distance_km(22.0, 88.0, 22.0, 88.0), 0.0);
    }

    fn stored_event(lat: f64, lon: f64) -> FireEvent {
        let now = Utc::now();
        FireEvent {
            id: Uuid::new_v4(),
            latitude: lat,
            longitude: lon,
            first_seen: now,
            last_seen: now,
            source: "VIIRS_SNPP".to_string(),
            alert_count: 1,
            frp_mw: 10.0,
            confidence: 80.0,
            est_area_m2: 56_250.0,
            zone: Zone::WestBengal,
            land_type: LandType::Unknown,
        }
    }

    fn candidate(family: SensorFamily, lat: f64, lon: f64) -> EventCandidate {
        EventCandidate {
            latitude: lat,
            longitude: lon,
            frp_mw: 15.0,
            confidence: 80.0,
            member_count: 1,
            source: "GEO_IR".to_string(),
            family,
            zone: Zone::WestBengal,
            land_type: LandType::Unknown,
        }
    }

    #[test]
    fn coarse_candidate_matches_at_2km() {
        // ~2 km north of the stored event
        let stored = vec![stored_event(22.000, 88.000)];
        let coarse = candidate(SensorFamily::Coarse, 22.018, 88.000);
        assert!(EventMatcher::find_match(&coarse, &stored).is_some());
    }

    #[test]
    fn fine_candidate_does_not_match_at_2km() {
        let stored = vec![stored_event(22.000, 88.000)];
        let fine = candidate(SensorFamily::Fine, 22.018, 88.000);
        assert!(EventMatcher::find_match(&fine, &stored).is_none());
    }

    #[test]
    fn fine_candidate_matches_inside_100m() {
        let stored = vec![stored_event(22.0000, 88.0000)];
        let fine = candidate(SensorFamily::Fine, 22.0005, 88.0000);
        assert!(EventMatcher::find_match(&fine, &stored).is_some());
    }

    #[test]
    fn first_match_wins() {
        let first = stored_event(22.000, 88.000);
        let second = stored_event(22.001, 88.001);
        let first_id = first.id;
        let stored = vec![first, second];

        let coarse = candidate(SensorFamily::Coarse, 22.0005, 88.0005);
        let matched = EventMatcher::find_match(&coarse, &stored).unwrap();
        assert_eq!(matched.id, first_id);
    }
}
