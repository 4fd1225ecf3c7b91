//! Pipeline components
//!
//! One file per component, leaf-first: feed retrieval and normalization,
//! in-cycle clustering, land-use verification, event matching and merge
//! reconciliation, alert gating and notification.

pub mod alert_gate;
pub mod clusterer;
pub mod feeds;
pub mod matcher;
pub mod merge_policy;
pub mod normalizer;
pub mod overpass_client;
pub mod telegram_notifier;
pub mod verifier;
pub mod zone_classifier;

pub use alert_gate::AlertGate;
pub use feeds::{FeedSource, FirmsFeed, RawBatch};
pub use matcher::{EventMatcher, MatchOutcome};
pub use normalizer::{FirmsAdapter, GeoAdapter, SourceAdapter};
pub use overpass_client::{LandUseOracle, OverpassClient};
pub use telegram_notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use verifier::{GroundTruthVerifier, RejectReason, Verdict};
