//! Core data model for the detection fusion pipeline
//!
//! Three record lifetimes, shortest first:
//! - [`Detection`] lives for one polling cycle, between normalization and
//!   clustering.
//! - [`Cluster`] lives for one polling cycle, between clustering and the
//!   match-or-insert decision.
//! - [`FireEvent`] is persistent: one row per distinct physical fire,
//!   patched in place every cycle the fire is still visible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sensor geolocation class, assigned by the adapter that produced a
/// detection and carried through to the matcher.
///
/// The two families have very different positional uncertainty, so the
/// matcher keeps two independently tuned radius sets: a coarse reading may
/// corroborate a known precise event, but must not steal an unrelated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorFamily {
    /// Polar orbiters (VIIRS, MODIS), ~375 m pixel footprint
    Fine,
    /// Geostationary imagers, ~2 km pixel footprint
    Coarse,
}

impl SensorFamily {
    /// Half-width of the store pre-filter bounding box, in degrees.
    pub fn search_radius_deg(self) -> f64 {
        match self {
            SensorFamily::Fine => 0.001,
            SensorFamily::Coarse => 0.025,
        }
    }

    /// Maximum accepted distance to an existing event, in km.
    pub fn match_limit_km(self) -> f64 {
        match self {
            SensorFamily::Fine => 0.1,
            SensorFamily::Coarse => 2.5,
        }
    }

    /// Nominal single-pixel ground footprint, in m². Feeds the coarse
    /// area proxy on insert; not a geometric fire perimeter.
    pub fn pixel_footprint_m2(self) -> f64 {
        match self {
            SensorFamily::Fine => 375_000.0,
            SensorFamily::Coarse => 2_000_000.0,
        }
    }
}

/// Monitoring zone tag.
///
/// Closed enumeration; classification is by priority-ordered bounding box
/// in [`crate::services::zone_classifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    WestBengal,
    PunjabHaryana,
    DelhiNcr,
    Other,
}

impl Zone {
    /// The home zone: always verified, always alert-worthy.
    pub const HOME: Zone = Zone::WestBengal;

    /// Secondary high-risk zone: alert-worthy above a lower threshold.
    pub const SECONDARY: Zone = Zone::PunjabHaryana;

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::WestBengal => "WEST_BENGAL",
            Zone::PunjabHaryana => "PUNJAB_HARYANA",
            Zone::DelhiNcr => "DELHI_NCR",
            Zone::Other => "OTHER",
        }
    }

    pub fn from_str_tag(tag: &str) -> Zone {
        match tag {
            "WEST_BENGAL" => Zone::WestBengal,
            "PUNJAB_HARYANA" => Zone::PunjabHaryana,
            "DELHI_NCR" => Zone::DelhiNcr,
            _ => Zone::Other,
        }
    }
}

/// Land-use classification at a detection site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandType {
    Farm,
    Forest,
    /// Industrial/residential/railway/quarry/mine — hard noise reject
    Industry,
    /// Water body — sun-glint false positive, reject
    Water,
    /// Oracle consulted but no mapped tags nearby. Accepted: most unmapped
    /// rural land carries no tags, and absence of map data must not
    /// suppress a real fire.
    Unknown,
    /// Oracle deliberately not consulted (quota policy tier 2 skip)
    Unverified,
}

impl LandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandType::Farm => "FARM",
            LandType::Forest => "FOREST",
            LandType::Industry => "INDUSTRY",
            LandType::Water => "WATER",
            LandType::Unknown => "UNKNOWN",
            LandType::Unverified => "UNVERIFIED",
        }
    }

    pub fn from_str_tag(tag: &str) -> LandType {
        match tag {
            "FARM" => LandType::Farm,
            "FOREST" => LandType::Forest,
            "INDUSTRY" => LandType::Industry,
            "WATER" => LandType::Water,
            "UNVERIFIED" => LandType::Unverified,
            _ => LandType::Unknown,
        }
    }
}

/// One normalized satellite reading. Created fresh each cycle by a source
/// adapter, discarded after clustering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Canonical source tag, e.g. "VIIRS_SNPP"
    pub source: String,
    pub family: SensorFamily,
    pub latitude: f64,
    pub longitude: f64,
    /// Fire radiative power, MW. Sanitized: always finite, ≥ 0 defaulting
    /// to 0.0 when the feed omitted or corrupted it.
    pub frp_mw: f64,
    /// Canonical confidence percent, 0–100
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
}

/// In-cycle aggregation of co-located detections from one source.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Mean of member coordinates
    pub latitude: f64,
    pub longitude: f64,
    /// Sum of member intensities: multiple pixels over one anomaly report
    /// additive radiative power, not repeated measurements of one value.
    pub frp_mw: f64,
    pub member_count: usize,
    pub source: String,
    pub family: SensorFamily,
    /// Max member confidence
    pub confidence: f64,
}

/// Persistent record of a distinct physical fire.
///
/// Coordinates are fixed at creation and never recomputed; the matcher's
/// tolerance absorbs positional drift between cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireEvent {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Deduplicated union of contributing source tags, ", "-joined
    pub source: String,
    /// Number of cycles this fire has been observed, ≥ 1
    pub alert_count: i64,
    /// Maximum FRP ever observed for this event; non-decreasing
    pub frp_mw: f64,
    pub confidence: f64,
    /// Coarse area proxy (pixel footprint × member count × sub-pixel
    /// fraction), not a perimeter
    pub est_area_m2: f64,
    pub zone: Zone,
    pub land_type: LandType,
}

/// A cluster annotated with zone and land-use results, ready for the
/// match-or-insert decision.
#[derive(Debug, Clone)]
pub struct EventCandidate {
    pub latitude: f64,
    pub longitude: f64,
    pub frp_mw: f64,
    pub confidence: f64,
    pub member_count: usize,
    pub source: String,
    pub family: SensorFamily,
    pub zone: Zone,
    pub land_type: LandType,
}

impl EventCandidate {
    pub fn from_cluster(cluster: &Cluster, zone: Zone, land_type: LandType) -> Self {
        Self {
            latitude: cluster.latitude,
            longitude: cluster.longitude,
            frp_mw: cluster.frp_mw,
            confidence: cluster.confidence,
            member_count: cluster.member_count,
            source: cluster.source.clone(),
            family: cluster.family,
            zone,
            land_type,
        }
    }
}
