//! Polling-cycle orchestration
//!
//! One cycle walks the stages in order:
//! fetch all feeds (concurrent, per-call timeout) → normalize → cluster →
//! per cluster: classify zone → verify land use → noise verdict →
//! match-or-insert → alert gate (inserted events only) → notify.
//!
//! The cycle is fail-soft end to end: a dead feed, oracle outage, store
//! hiccup or notifier failure degrades that one step to its documented
//! safe default and the cycle still completes with a summary.

use crate::config::SentinelConfig;
use crate::models::{Detection, EventCandidate};
use crate::services::{
    clusterer, zone_classifier, AlertGate, EventMatcher, FeedSource, GroundTruthVerifier,
    MatchOutcome, Notifier, RejectReason, SourceAdapter, Verdict,
};
use crate::services::telegram_notifier::compose_alert;
use chrono::Utc;
use futures::future::join_all;
use sqlx::SqlitePool;
use std::time::Duration;

/// A feed paired with the adapter that normalizes its batches.
pub struct FeedBinding {
    pub feed: Box<dyn FeedSource>,
    pub adapter: Box<dyn SourceAdapter>,
}

/// Per-cycle outcome counts, logged at cycle end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub detections: usize,
    pub clusters: usize,
    pub filtered_industry: usize,
    pub filtered_water: usize,
    pub filtered_artifact: usize,
    pub inserted: usize,
    pub merged: usize,
    pub alerts_sent: usize,
    pub sources_failed: usize,
    pub store_errors: usize,
}

/// The sentinel: owns every pipeline component for the lifetime of the
/// process and runs one polling cycle at a time.
pub struct Sentinel {
    db: SqlitePool,
    feeds: Vec<FeedBinding>,
    verifier: GroundTruthVerifier,
    matcher: EventMatcher,
    gate: AlertGate,
    notifier: Box<dyn Notifier>,
    feed_timeout: Duration,
    notify_timeout: Duration,
}

impl Sentinel {
    pub fn new(
        db: SqlitePool,
        feeds: Vec<FeedBinding>,
        verifier: GroundTruthVerifier,
        gate: AlertGate,
        notifier: Box<dyn Notifier>,
        config: &SentinelConfig,
    ) -> Self {
        Self {
            db,
            feeds,
            verifier,
            matcher: EventMatcher::new(),
            gate,
            notifier,
            feed_timeout: config.feed_timeout(),
            notify_timeout: config.notify_timeout(),
        }
    }

    /// Run one polling cycle to completion.
    pub async fn run_cycle(&self) -> CycleSummary {
        let now = Utc::now();
        let mut summary = CycleSummary::default();

        let detections = self.fetch_and_normalize(&mut summary).await;
        summary.detections = detections.len();

        if detections.is_empty() {
            tracing::info!("Sector clear, no detections this cycle");
            return summary;
        }

        let clusters = clusterer::cluster(&detections);
        summary.clusters = clusters.len();
        tracing::info!(
            detections = summary.detections,
            clusters = summary.clusters,
            "Processing cycle"
        );

        for cluster in &clusters {
            let zone = zone_classifier::classify(cluster.latitude, cluster.longitude);
            let land_type = self
                .verifier
                .classify(cluster.latitude, cluster.longitude, zone, cluster.frp_mw)
                .await;

            match self.verifier.verdict(land_type, cluster.frp_mw) {
                Verdict::Reject(RejectReason::Industry) => {
                    summary.filtered_industry += 1;
                    continue;
                }
                Verdict::Reject(RejectReason::Water) => {
                    summary.filtered_water += 1;
                    continue;
                }
                Verdict::Reject(RejectReason::SensorArtifact) => {
                    tracing::warn!(
                        latitude = cluster.latitude,
                        longitude = cluster.longitude,
                        frp_mw = cluster.frp_mw,
                        "Implausibly hot anomaly rejected as sensor artifact"
                    );
                    summary.filtered_artifact += 1;
                    continue;
                }
                Verdict::Accept(land_type) => {
                    let candidate = EventCandidate::from_cluster(cluster, zone, land_type);

                    match self.matcher.match_or_insert(&self.db, &candidate, now).await {
                        Ok(MatchOutcome::Merged { .. }) => {
                            // Already-known fire: the gate is never consulted
                            summary.merged += 1;
                        }
                        Ok(MatchOutcome::Inserted(event)) => {
                            summary.inserted += 1;
                            if self.gate.should_escalate(event.zone, event.frp_mw) {
                                self.escalate(&event, &mut summary).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Store unavailable for cluster, skipping");
                            summary.store_errors += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            inserted = summary.inserted,
            merged = summary.merged,
            filtered = summary.filtered_industry + summary.filtered_water + summary.filtered_artifact,
            alerts = summary.alerts_sent,
            sources_failed = summary.sources_failed,
            "Cycle complete"
        );

        summary
    }

    /// Fetch every configured feed concurrently, each bounded by the feed
    /// timeout, and normalize through the paired adapter. A failed source
    /// contributes nothing; the rest proceed.
    async fn fetch_and_normalize(&self, summary: &mut CycleSummary) -> Vec<Detection> {
        let observed_at = Utc::now();

        let fetches = self.feeds.iter().map(|binding| async move {
            let result = tokio::time::timeout(self.feed_timeout, binding.feed.fetch()).await;
            (binding, result)
        });

        let mut detections = Vec::new();
        for (binding, result) in join_all(fetches).await {
            match result {
                Ok(Ok(batch)) => {
                    detections.extend(binding.adapter.normalize(&batch, observed_at));
                }
                Ok(Err(e)) => {
                    tracing::warn!(source = binding.feed.source_tag(), error = %e, "Source skipped");
                    summary.sources_failed += 1;
                }
                Err(_) => {
                    tracing::warn!(source = binding.feed.source_tag(), "Source deadline exceeded, skipped");
                    summary.sources_failed += 1;
                }
            }
        }

        detections
    }

    async fn escalate(&self, event: &crate::models::FireEvent, summary: &mut CycleSummary) {
        let text = compose_alert(event);
        tracing::info!(event_id = %event.id, zone = event.zone.as_str(), frp_mw = event.frp_mw, "Escalating alert");

        match tokio::time::timeout(self.notify_timeout, self.notifier.push(&text)).await {
            Ok(Ok(())) => summary.alerts_sent += 1,
            Ok(Err(e)) => {
                tracing::warn!(event_id = %event.id, error = %e, "Alert push failed, not retried");
            }
            Err(_) => {
                tracing::warn!(event_id = %event.id, "Alert push timed out, not retried");
            }
        }
    }
}
