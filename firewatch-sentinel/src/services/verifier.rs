//! Ground-truth verification
//!
//! Wraps the land-use oracle with the quota policy, the tag-to-land-type
//! mapping, and the physical-plausibility filter.
//!
//! Quota policy (checked before any external call):
//! - Tier 1: coordinates in the home zone are always verified, whatever
//!   the intensity.
//! - Tier 2: elsewhere, only intensities at or above the configured floor
//!   are worth an oracle call; below it the result is UNVERIFIED and the
//!   oracle quota is preserved.
//!
//! Failure semantics are fail-open: any oracle error, timeout or malformed
//! response maps to UNKNOWN, which downstream accepts. An oracle outage
//! must never silently suppress alerting.

use crate::models::{LandType, Zone};
use crate::services::overpass_client::{LandUseOracle, TagPair};
use std::time::Duration;

/// Lookup radius around the detection coordinate, meters.
const LOOKUP_RADIUS_M: u32 = 500;

/// `landuse` values mapped to INDUSTRY (hard reject).
const INDUSTRY_LANDUSE: [&str; 5] = ["industrial", "residential", "railway", "quarry", "mine"];

/// `landuse` values mapped to FARM.
const FARM_LANDUSE: [&str; 3] = ["farmland", "farm", "orchard"];

/// Why a cluster was rejected as noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Industrial/urban heat source
    Industry,
    /// Water body: sun-glint false positive
    Water,
    /// Implausibly hot without supporting land use: likely sensor artifact
    SensorArtifact,
}

/// Noise-filter verdict for one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept(LandType),
    Reject(RejectReason),
}

/// Map oracle tags to a land type.
///
/// Precedence is reject-biased: Industry > Water > Farm > Forest. Nothing
/// matched means UNKNOWN, which is accepted — most unmapped rural land has
/// no tags at all, and absence of map data must not suppress a real fire.
pub fn classify_tags(tags: &[TagPair]) -> LandType {
    let mut saw_water = false;
    let mut saw_farm = false;
    let mut saw_forest = false;

    for (key, value) in tags {
        match key.as_str() {
            "industrial" => return LandType::Industry,
            "natural" if value.as_str() == "water" => saw_water = true,
            "water" => saw_water = true,
            "landuse" => {
                let value = value.as_str();
                if INDUSTRY_LANDUSE.contains(&value) {
                    return LandType::Industry;
                } else if FARM_LANDUSE.contains(&value) {
                    saw_farm = true;
                } else if value == "forest" {
                    saw_forest = true;
                }
            }
            _ => {}
        }
    }

    if saw_water {
        LandType::Water
    } else if saw_farm {
        LandType::Farm
    } else if saw_forest {
        LandType::Forest
    } else {
        LandType::Unknown
    }
}

/// Quota-aware, fail-open land-use verifier.
pub struct GroundTruthVerifier {
    oracle: Box<dyn LandUseOracle>,
    /// Tier-2 verification floor, MW
    verify_min_frp_mw: f64,
    /// Plausibility ceiling, MW
    artifact_ceiling_mw: f64,
    /// Outer bound on the oracle call, over and above the client's own
    /// network timeout
    oracle_timeout: Duration,
}

impl GroundTruthVerifier {
    pub fn new(
        oracle: Box<dyn LandUseOracle>,
        verify_min_frp_mw: f64,
        artifact_ceiling_mw: f64,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            verify_min_frp_mw,
            artifact_ceiling_mw,
            oracle_timeout,
        }
    }

    /// Classify land use at a coordinate, subject to the quota policy.
    pub async fn classify(&self, latitude: f64, longitude: f64, zone: Zone, frp_mw: f64) -> LandType {
        // Tier gate first: no oracle call for low-stakes readings outside home
        if zone != Zone::HOME && frp_mw < self.verify_min_frp_mw {
            tracing::debug!(latitude, longitude, frp_mw, "Verification skipped, quota preserved");
            return LandType::Unverified;
        }

        let lookup = tokio::time::timeout(
            self.oracle_timeout,
            self.oracle.query(latitude, longitude, LOOKUP_RADIUS_M),
        )
        .await;

        match lookup {
            Ok(Ok(tags)) => classify_tags(&tags),
            Ok(Err(e)) => {
                tracing::warn!(latitude, longitude, error = %e, "Oracle failed, treating as UNKNOWN");
                LandType::Unknown
            }
            Err(_) => {
                tracing::warn!(latitude, longitude, "Oracle deadline exceeded, treating as UNKNOWN");
                LandType::Unknown
            }
        }
    }

    /// Final noise verdict for a cluster, combining the land-use result
    /// with the physical-plausibility filter.
    pub fn verdict(&self, land_type: LandType, frp_mw: f64) -> Verdict {
        match land_type {
            LandType::Industry => return Verdict::Reject(RejectReason::Industry),
            LandType::Water => return Verdict::Reject(RejectReason::Water),
            _ => {}
        }

        // Plausibility ceiling: implausibly hot readings pass only when the
        // land use independently checks out as burnable (or unmapped).
        if frp_mw > self.artifact_ceiling_mw
            && !matches!(land_type, LandType::Farm | LandType::Forest | LandType::Unknown)
        {
            return Verdict::Reject(RejectReason::SensorArtifact);
        }

        Verdict::Accept(land_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::overpass_client::OracleError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stub oracle returning a fixed answer and counting calls.
    struct StubOracle {
        tags: Result<Vec<TagPair>, ()>,
        calls: Arc<AtomicUsize>,
    }

    impl StubOracle {
        fn returning(tags: Vec<TagPair>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    tags: Ok(tags),
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn failing() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    tags: Err(()),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl LandUseOracle for StubOracle {
        async fn query(
            &self,
            _latitude: f64,
            _longitude: f64,
            _radius_m: u32,
        ) -> Result<Vec<TagPair>, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.tags {
                Ok(tags) => Ok(tags.clone()),
                Err(()) => Err(OracleError::Network("stub outage".to_string())),
            }
        }
    }

    fn verifier(oracle: StubOracle) -> GroundTruthVerifier {
        GroundTruthVerifier::new(Box::new(oracle), 20.0, 300.0, Duration::from_secs(10))
    }

    fn tag(key: &str, value: &str) -> TagPair {
        (key.to_string(), value.to_string())
    }

    #[tokio::test]
    async fn home_zone_is_always_verified() {
        let (oracle, calls) = StubOracle::returning(vec![tag("landuse", "farmland")]);
        let verifier = verifier(oracle);

        let land = verifier.classify(23.5, 87.9, Zone::WestBengal, 0.5).await;
        assert_eq!(land, LandType::Farm);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn low_frp_outside_home_preserves_quota() {
        let (oracle, calls) = StubOracle::returning(vec![tag("landuse", "farmland")]);
        let verifier = verifier(oracle);

        for _ in 0..5 {
            let land = verifier.classify(19.0, 78.0, Zone::Other, 5.0).await;
            assert_eq!(land, LandType::Unverified);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0, "oracle must not be called");
    }

    #[tokio::test]
    async fn high_frp_outside_home_is_verified() {
        let (oracle, calls) = StubOracle::returning(vec![]);
        let verifier = verifier(oracle);

        let land = verifier.classify(19.0, 78.0, Zone::Other, 35.0).await;
        assert_eq!(land, LandType::Unknown);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oracle_failure_is_fail_open() {
        let (oracle, _) = StubOracle::failing();
        let verifier = verifier(oracle);

        let land = verifier.classify(23.5, 87.9, Zone::WestBengal, 10.0).await;
        assert_eq!(land, LandType::Unknown, "outage maps to UNKNOWN, never a reject");
        // UNKNOWN is accepted downstream, so alerting stays possible
        assert_eq!(verifier.verdict(land, 10.0), Verdict::Accept(LandType::Unknown));
    }

    #[test]
    fn tag_mapping_precedence() {
        assert_eq!(classify_tags(&[tag("industrial", "yes")]), LandType::Industry);
        assert_eq!(classify_tags(&[tag("landuse", "residential")]), LandType::Industry);
        assert_eq!(classify_tags(&[tag("landuse", "quarry")]), LandType::Industry);
        assert_eq!(classify_tags(&[tag("natural", "water")]), LandType::Water);
        assert_eq!(classify_tags(&[tag("landuse", "orchard")]), LandType::Farm);
        assert_eq!(classify_tags(&[tag("landuse", "forest")]), LandType::Forest);
        assert_eq!(classify_tags(&[]), LandType::Unknown);

        // Industry outranks everything nearby; water outranks farm
        assert_eq!(
            classify_tags(&[tag("landuse", "farmland"), tag("landuse", "railway")]),
            LandType::Industry
        );
        assert_eq!(
            classify_tags(&[tag("landuse", "farmland"), tag("natural", "water")]),
            LandType::Water
        );
        assert_eq!(
            classify_tags(&[tag("landuse", "forest"), tag("landuse", "farm")]),
            LandType::Farm
        );
    }

    #[test]
    fn verdict_rejects_noise_classes() {
        let (oracle, _) = StubOracle::returning(vec![]);
        let verifier = verifier(oracle);

        assert_eq!(
            verifier.verdict(LandType::Industry, 10.0),
            Verdict::Reject(RejectReason::Industry)
        );
        assert_eq!(
            verifier.verdict(LandType::Water, 10.0),
            Verdict::Reject(RejectReason::Water)
        );
        assert_eq!(verifier.verdict(LandType::Farm, 10.0), Verdict::Accept(LandType::Farm));
    }

    #[test]
    fn plausibility_ceiling() {
        let (oracle, _) = StubOracle::returning(vec![]);
        let verifier = verifier(oracle);

        // Hot but confirmed burnable or unmapped: accepted
        assert_eq!(verifier.verdict(LandType::Farm, 450.0), Verdict::Accept(LandType::Farm));
        assert_eq!(
            verifier.verdict(LandType::Unknown, 450.0),
            Verdict::Accept(LandType::Unknown)
        );
        // Hot and unverified: rejected as sensor artifact
        assert_eq!(
            verifier.verdict(LandType::Unverified, 450.0),
            Verdict::Reject(RejectReason::SensorArtifact)
        );
        // At the ceiling exactly: not above, accepted
        assert_eq!(
            verifier.verdict(LandType::Unverified, 300.0),
            Verdict::Accept(LandType::Unverified)
        );
    }
}
