//! Fire event store operations
//!
//! The store contract the matcher relies on:
//! - `find_in_box(lat_range, lon_range)` — coarse bounding-box pre-filter
//! - `insert_event(event)` — new event, returns the assigned id
//! - `apply_merge(id, patch)` — partial update of the merge-owned fields
//!
//! Timestamps are stored as RFC 3339 text, ids as uuid text. Row decoding
//! is total: a damaged row is a hard error, never a silent skip, so store
//! corruption surfaces instead of quietly shrinking match candidates.

use crate::models::{FireEvent, LandType, Zone};
use crate::services::merge_policy::EventPatch;
use chrono::{DateTime, Utc};
use firewatch_common::{Error, Result};
use sqlx::SqlitePool;
use std::ops::RangeInclusive;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct FireEventRow {
    id: String,
    lat: f64,
    lon: f64,
    first_seen: String,
    last_seen: String,
    source: String,
    alert_count: i64,
    frp_mw: f64,
    confidence: f64,
    est_area_m2: f64,
    zone: String,
    land_type: String,
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidInput(format!("bad {} timestamp '{}': {}", field, raw, e)))
}

impl FireEventRow {
    fn into_event(self) -> Result<FireEvent> {
        Ok(FireEvent {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| Error::InvalidInput(format!("bad event id '{}': {}", self.id, e)))?,
            latitude: self.lat,
            longitude: self.lon,
            first_seen: parse_timestamp(&self.first_seen, "first_seen")?,
            last_seen: parse_timestamp(&self.last_seen, "last_seen")?,
            source: self.source,
            alert_count: self.alert_count,
            frp_mw: self.frp_mw,
            confidence: self.confidence,
            est_area_m2: self.est_area_m2,
            zone: Zone::from_str_tag(&self.zone),
            land_type: LandType::from_str_tag(&self.land_type),
        })
    }
}

/// Fetch all events whose stored coordinates fall inside the box.
///
/// Ordered by first_seen then id so the matcher's greedy first-match is
/// deterministic: the oldest plausible event wins.
pub async fn find_in_box(
    pool: &SqlitePool,
    lat_range: RangeInclusive<f64>,
    lon_range: RangeInclusive<f64>,
) -> Result<Vec<FireEvent>> {
    let rows: Vec<FireEventRow> = sqlx::query_as(
        r#"
        SELECT id, lat, lon, first_seen, last_seen, source, alert_count,
               frp_mw, confidence, est_area_m2, zone, land_type
        FROM fires
        WHERE lat BETWEEN ? AND ? AND lon BETWEEN ? AND ?
        ORDER BY first_seen, id
        "#,
    )
    .bind(*lat_range.start())
    .bind(*lat_range.end())
    .bind(*lon_range.start())
    .bind(*lon_range.end())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(FireEventRow::into_event).collect()
}

/// Insert a new event, returning its id.
pub async fn insert_event(pool: &SqlitePool, event: &FireEvent) -> Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO fires (id, lat, lon, first_seen, last_seen, source, alert_count,
                           frp_mw, confidence, est_area_m2, zone, land_type)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.id.to_string())
    .bind(event.latitude)
    .bind(event.longitude)
    .bind(event.first_seen.to_rfc3339())
    .bind(event.last_seen.to_rfc3339())
    .bind(&event.source)
    .bind(event.alert_count)
    .bind(event.frp_mw)
    .bind(event.confidence)
    .bind(event.est_area_m2)
    .bind(event.zone.as_str())
    .bind(event.land_type.as_str())
    .execute(pool)
    .await?;

    Ok(event.id)
}

/// Patch the merge-owned fields of an existing event. Coordinates and
/// first_seen are deliberately not updatable through this operation.
pub async fn apply_merge(pool: &SqlitePool, id: Uuid, patch: &EventPatch) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE fires
        SET last_seen = ?, frp_mw = ?, source = ?, alert_count = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.last_seen.to_rfc3339())
    .bind(patch.frp_mw)
    .bind(&patch.source)
    .bind(patch.alert_count)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("fire event {}", id)));
    }

    Ok(())
}

/// Fetch one event by id.
pub async fn get_event(pool: &SqlitePool, id: Uuid) -> Result<FireEvent> {
    let row: Option<FireEventRow> = sqlx::query_as(
        r#"
        SELECT id, lat, lon, first_seen, last_seen, source, alert_count,
               frp_mw, confidence, est_area_m2, zone, land_type
        FROM fires
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| Error::NotFound(format!("fire event {}", id)))?
        .into_event()
}

/// Count all stored events. Used by cycle reporting and tests.
pub async fn count_events(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fires")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
