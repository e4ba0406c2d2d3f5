//! `CourtRecordsClient`, the entry point the rest of an application uses.
//!
//! The client owns one rate limiter and one cache and shares them with its
//! router and refresher. Build one per process; tests build as many isolated
//! clients as they like.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::cache::{CacheStats, ResultCache};
use crate::config::EngineConfig;
use crate::http_client::{HttpClient, Transport};
use crate::normalize::canonical_case_number;
use crate::rate_limiter::{RateLimitState, RateLimiter};
use crate::refresher::Refresher;
use crate::router::SearchRouter;
use crate::strategy::StrategyTable;
use crate::types::{CaseQuery, CaseRecord, CourtError, CourtResult, Lookup, QueryKind, RefreshReport};

/// Rate-limit usage for one source or for all of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RateLimitReport {
    Single(RateLimitState),
    All(BTreeMap<String, RateLimitState>),
}

pub struct CourtRecordsClient {
    config: EngineConfig,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResultCache<Vec<CaseRecord>>>,
    router: Arc<SearchRouter>,
    refresher: Refresher,
}

impl CourtRecordsClient {
    /// Client talking to the configured portal over HTTP.
    pub fn new(config: EngineConfig) -> CourtResult<Self> {
        let transport = Arc::new(HttpClient::new(&config.user_agent, config.request_timeout()));
        Self::with_transport(config, transport)
    }

    /// Client using a caller-supplied transport.
    pub fn with_transport(config: EngineConfig, transport: Arc<dyn Transport>) -> CourtResult<Self> {
        Self::build(config, transport, StrategyTable::default())
    }

    /// Client with a custom strategy table.
    pub fn with_strategies(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        strategies: StrategyTable,
    ) -> CourtResult<Self> {
        Self::build(config, transport, strategies)
    }

    fn build(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        strategies: StrategyTable,
    ) -> CourtResult<Self> {
        config.validate()?;
        for strategy in strategies.all() {
            if !config.sources.contains_key(strategy.source) {
                return Err(CourtError::Config(format!(
                    "strategy {} uses unconfigured source {}",
                    strategy.id, strategy.source
                )));
            }
        }

        let limiter = Arc::new(RateLimiter::new(config.sources.clone()));
        let cache = Arc::new(ResultCache::new(config.cache_ttl()));
        let router = Arc::new(
            SearchRouter::new(&config, transport, limiter.clone(), cache.clone())
                .with_strategies(strategies),
        );
        let refresher = Refresher::new(router.clone(), cache.clone(), config.refresh_width());

        tracing::debug!(
            "court records client ready: {} source(s), {} refresh worker(s)",
            config.sources.len(),
            refresher.width()
        );

        Ok(Self {
            config,
            limiter,
            cache,
            router,
            refresher,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Search by case number or party name.
    ///
    /// A name search can return many records; a case-number search returns
    /// at most one.
    pub async fn search_cases(
        &self,
        query: &str,
        kind: QueryKind,
        deadline: Option<Instant>,
    ) -> CourtResult<Lookup<Vec<CaseRecord>>> {
        let query = CaseQuery::new(query, kind)?;
        self.router.lookup(&query, deadline).await
    }

    /// Full record for one case number.
    pub async fn get_case_details(
        &self,
        case_number: &str,
        deadline: Option<Instant>,
    ) -> CourtResult<Lookup<CaseRecord>> {
        let query = CaseQuery::case_number(case_number)?;
        let found = self.router.lookup(&query, deadline).await?;
        Ok(match found.found().and_then(|records| records.into_iter().next()) {
            Some(record) => Lookup::Found(record),
            None => Lookup::NotFound,
        })
    }

    /// Refresh a batch of tracked cases, isolating per-case failures.
    pub async fn update_tracked_cases<I, S>(
        &self,
        case_numbers: I,
        deadline: Option<Instant>,
    ) -> RefreshReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.refresher.refresh(case_numbers, deadline).await
    }

    /// Usage for `source`, or every source when `None`.
    pub fn rate_limit_status(&self, source: Option<&str>) -> CourtResult<RateLimitReport> {
        match source {
            Some(source) => Ok(RateLimitReport::Single(self.limiter.status(source)?)),
            None => Ok(RateLimitReport::All(self.limiter.status_all())),
        }
    }

    /// Drop every cached entry holding `case_number`.
    pub fn invalidate_case(&self, case_number: &str) -> usize {
        let wanted = canonical_case_number(case_number);
        self.cache
            .invalidate_where(|records| records.iter().any(|r| r.case_number == wanted))
    }

    pub fn sweep_cache(&self) -> usize {
        self.cache.sweep()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Periodically purge expired cache entries until the handle is aborted.
    pub fn spawn_cache_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                cache.sweep();
            }
        })
    }
}
