//! Geographic zone classification
//!
//! Pure total function: coordinate → zone tag. Zones are priority-ordered,
//! possibly-overlapping inclusive bounding boxes; the first matching box
//! wins. The order is part of the contract (DelhiNcr sits entirely inside
//! the PunjabHaryana box on the latitude axis), so the table below must
//! not be reordered or made data-driven.

use crate::models::Zone;

struct ZoneBox {
    zone: Zone,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

/// Priority order: home zone, then secondary, then the NCR pocket.
const ZONE_BOXES: [ZoneBox; 3] = [
    ZoneBox {
        zone: Zone::WestBengal,
        lat_min: 21.5,
        lat_max: 27.3,
        lon_min: 85.8,
        lon_max: 89.9,
    },
    ZoneBox {
        zone: Zone::PunjabHaryana,
        lat_min: 28.4,
        lat_max: 32.5,
        lon_min: 73.8,
        lon_max: 77.8,
    },
    ZoneBox {
        zone: Zone::DelhiNcr,
        lat_min: 28.0,
        lat_max: 28.9,
        lon_min: 76.8,
        lon_max: 77.5,
    },
];

/// Classify a coordinate into its monitoring zone. Box edges are inclusive.
pub fn classify(latitude: f64, longitude: f64) -> Zone {
    for zone_box in &ZONE_BOXES {
        if latitude >= zone_box.lat_min
            && latitude <= zone_box.lat_max
            && longitude >= zone_box.lon_min
            && longitude <= zone_box.lon_max
        {
            return zone_box.zone;
        }
    }
    Zone::Other
}
