//! Resolves the wind field for a whole site list
//!
//! Each site is resolved independently; a site whose samples all failed, or
//! that missed the run deadline, is logged and left out of the cycle's output
//! without affecting the others.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::ResolverConfig;
use crate::data::{ForecastClient, ForecastError, ForecastSource, Site, SiteWindResult};
use crate::wind::{ResolveError, SpatialSampler};

/// Outcome of one resolution cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// One entry per resolved site, in input order
    pub results: Vec<SiteWindResult>,
    /// Sites that were dropped this cycle
    pub failures: Vec<ResolveError>,
}

/// Orchestrates per-site resolution with bounded concurrency
pub struct WindFieldResolver<S> {
    sampler: SpatialSampler<S>,
    max_concurrent_sites: usize,
}

impl WindFieldResolver<ForecastClient> {
    /// Builds an Open-Meteo backed resolver from configuration
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ForecastError> {
        let mut client = ForecastClient::new(config.flavor)
            .with_timezone(config.timezone.clone())
            .with_request_timeout(config.request_timeout())?;
        if let Some(url) = &config.base_url {
            client = client.with_base_url(url.clone());
        }
        Ok(Self::new(Arc::new(client), config))
    }
}

impl<S: ForecastSource> WindFieldResolver<S> {
    pub fn new(source: Arc<S>, config: &ResolverConfig) -> Self {
        let sampler = SpatialSampler::new(source)
            .with_pattern(config.pattern, config.delta_deg)
            .with_mode(config.interpolation)
            .with_render_offset(config.render_offset_deg);
        Self {
            sampler,
            max_concurrent_sites: config.max_concurrent_sites.max(1),
        }
    }

    /// Resolves every site at `now`, keeping failures for inspection
    pub async fn resolve_report_at(&self, sites: &[Site], now: DateTime<Utc>) -> CycleReport {
        self.resolve_report(sites, now, None).await
    }

    /// Resolves every site at the current instant, giving up on any site still
    /// pending `limit` after the run started
    pub async fn resolve_report_within(&self, sites: &[Site], limit: Duration) -> CycleReport {
        self.resolve_report(sites, Utc::now(), Some(limit)).await
    }

    async fn resolve_report(
        &self,
        sites: &[Site],
        now: DateTime<Utc>,
        limit: Option<Duration>,
    ) -> CycleReport {
        // One deadline for the whole run, shared by every site
        let deadline = limit.map(|limit| (Instant::now() + limit, limit));
        let sampler = &self.sampler;

        let outcomes: Vec<Result<SiteWindResult, ResolveError>> = stream::iter(sites.iter().cloned())
            .map(|site| async move {
                let Some((at, limit)) = deadline else {
                    return sampler.resolve_site(&site, now).await;
                };
                match tokio::time::timeout_at(at, sampler.resolve_site(&site, now)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ResolveError::TimedOut {
                        site: site.name.clone(),
                        limit,
                    }),
                }
            })
            .buffered(self.max_concurrent_sites)
            .collect()
            .await;

        let mut report = CycleReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(error) => {
                    warn!(%error, "dropping site from this cycle");
                    report.failures.push(error);
                }
            }
        }

        info!(
            resolved = report.results.len(),
            failed = report.failures.len(),
            "wind field resolved"
        );
        report
    }

    /// Resolves every site at `now`; failed sites are absent from the output
    pub async fn resolve_all_at(&self, sites: &[Site], now: DateTime<Utc>) -> Vec<SiteWindResult> {
        self.resolve_report_at(sites, now).await.results
    }

    /// Resolves every site at the current instant
    pub async fn resolve_all(&self, sites: &[Site]) -> Vec<SiteWindResult> {
        self.resolve_all_at(sites, Utc::now()).await
    }

    /// Like [`resolve_all`](Self::resolve_all), dropping sites that are not
    /// done `limit` after the run started
    pub async fn resolve_all_within(&self, sites: &[Site], limit: Duration) -> Vec<SiteWindResult> {
        self.resolve_report_within(sites, limit).await.results
    }
}
