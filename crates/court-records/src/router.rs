//! Search strategy router.
//!
//! For one query the router walks its strategies strictly in priority order:
//!
//! ```text
//! Idle -> Fetching(s_i) -> Success          -> return (cached first)
//!                       -> Empty            -> Fetching(s_i+1)
//!                       -> Failed(transient) -> Fetching(s_i+1)
//! exhausted -> NotFound, or the last failure if no strategy got a 2xx answer
//! ```
//!
//! Each endpoint is fetched at most once per call. Retrying the whole lookup
//! is the caller's business.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::extract::{self, Extraction};
use crate::http_client::Transport;
use crate::normalize;
use crate::rate_limiter::{Admission, RateLimiter};
use crate::strategy::{Strategy, StrategyTable};
use crate::types::{CaseQuery, CaseRecord, CourtError, CourtResult, Lookup};

/// Outcome of one strategy attempt.
enum Attempt {
    Success(Vec<CaseRecord>),
    /// 2xx answer with nothing usable in it.
    Empty,
    /// Transient failure; `CourtError::is_transient` holds.
    Failed(CourtError),
}

/// Routes queries across upstream strategies.
pub struct SearchRouter {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResultCache<Vec<CaseRecord>>>,
    strategies: StrategyTable,
    base_url: String,
    request_timeout: Duration,
    admission_retries: u32,
    max_admission_wait: Duration,
}

impl SearchRouter {
    pub fn new(
        config: &EngineConfig,
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        cache: Arc<ResultCache<Vec<CaseRecord>>>,
    ) -> Self {
        Self {
            transport,
            limiter,
            cache,
            strategies: StrategyTable::default(),
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout(),
            admission_retries: config.admission_retries,
            max_admission_wait: config.max_admission_wait(),
        }
    }

    /// Replace the strategy table.
    pub fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    /// Look up a query, giving up with `CourtError::Timeout` at `deadline`.
    ///
    /// The deadline covers cache checks, rate-limit waits and every fetch.
    /// An in-flight fetch is dropped when it passes.
    pub async fn lookup(
        &self,
        query: &CaseQuery,
        deadline: Option<Instant>,
    ) -> CourtResult<Lookup<Vec<CaseRecord>>> {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.run(query))
                .await
                .unwrap_or_else(|_| {
                    tracing::warn!("lookup for {:?} passed its deadline", query.text);
                    Err(CourtError::Timeout)
                }),
            None => self.run(query).await,
        }
    }

    async fn run(&self, query: &CaseQuery) -> CourtResult<Lookup<Vec<CaseRecord>>> {
        let strategies = self.strategies.for_kind(query.kind);

        for strategy in strategies {
            if let Some(records) = self.cache.get(&strategy.fingerprint(query)) {
                tracing::debug!("cache hit for {:?} via {}", query.text, strategy.id);
                return Ok(Lookup::Found(records));
            }
        }

        let mut answered = false;
        let mut last_failure = None;

        for strategy in strategies {
            tracing::debug!("trying {} for {:?}", strategy.id, query.text);
            match self.attempt(strategy, query).await? {
                Attempt::Success(records) => {
                    tracing::info!(
                        "{} found {} record(s) for {:?}",
                        strategy.id,
                        records.len(),
                        query.text
                    );
                    self.cache
                        .put_default(strategy.fingerprint(query), records.clone());
                    return Ok(Lookup::Found(records));
                }
                Attempt::Empty => answered = true,
                Attempt::Failed(err) => {
                    tracing::warn!("{} failed: {err}", strategy.id);
                    last_failure = Some(err);
                }
            }
        }

        match last_failure {
            Some(err) if !answered => Err(err),
            _ => {
                tracing::info!("no matching case for {:?}", query.text);
                Ok(Lookup::NotFound)
            }
        }
    }

    /// One strategy attempt. `Err` is reserved for failures that must not be
    /// absorbed by falling through to the next strategy.
    async fn attempt(&self, strategy: &Strategy, query: &CaseQuery) -> CourtResult<Attempt> {
        if let Err(err) = self.admit(strategy.source).await {
            return if err.is_transient() {
                Ok(Attempt::Failed(err))
            } else {
                Err(err)
            };
        }

        let url = strategy.url(&self.base_url);
        let response = match self
            .transport
            .get(&url, &strategy.params(query), self.request_timeout)
            .await
        {
            Ok(response) => response,
            Err(err) => return Ok(Attempt::Failed(err)),
        };

        if !response.is_success() {
            return Ok(Attempt::Failed(CourtError::UpstreamHttp {
                endpoint: url,
                status: response.status,
            }));
        }

        match extract::extract(&response.body, strategy.kind) {
            Extraction::Found(raws) => {
                let records = normalize::normalize_all(&raws, query, strategy.id)?;
                if records.is_empty() {
                    tracing::debug!("{} listed no case matching {:?}", strategy.id, query.text);
                    Ok(Attempt::Empty)
                } else {
                    Ok(Attempt::Success(records))
                }
            }
            Extraction::NoResults => {
                tracing::debug!("{} reports no results for {:?}", strategy.id, query.text);
                Ok(Attempt::Empty)
            }
            Extraction::Failed(reason) => {
                tracing::warn!(
                    "{}",
                    CourtError::Extraction {
                        endpoint: url,
                        reason
                    }
                );
                Ok(Attempt::Empty)
            }
        }
    }

    /// Wait for admission to `source`, honouring the retry count and ceiling.
    async fn admit(&self, source: &str) -> CourtResult<()> {
        let mut waits = 0;
        loop {
            match self.limiter.try_admit(source)? {
                Admission::Allowed => return Ok(()),
                Admission::Denied { retry_after } => {
                    if waits >= self.admission_retries || retry_after > self.max_admission_wait {
                        return Err(CourtError::RateLimitExceeded {
                            source_key: source.to_string(),
                            retry_after_ms: retry_after.as_millis() as u64,
                        });
                    }
                    waits += 1;
                    tracing::debug!(
                        "{source} over budget, waiting {}ms",
                        retry_after.as_millis()
                    );
                    tokio::time::sleep(retry_after).await;
                }
            }
        }
    }
}
