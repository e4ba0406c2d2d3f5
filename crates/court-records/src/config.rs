//! Engine configuration: upstream location, per-source budgets, timeouts.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{CourtError, CourtResult};

/// Source key for the high-volume case-number / party-name index.
pub const SOURCE_COURT_INDEX: &str = "courtindex";
/// Source key for the register-of-actions search.
pub const SOURCE_ROA_SEARCH: &str = "roasearch";
/// Source key for the secondary register-of-actions subsystem.
pub const SOURCE_ODYSSEY_ROA: &str = "odyroa";

const DEFAULT_USER_AGENT: &str = "court-records/0.1 (case tracking client)";

/// Request budget for one upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBudget {
    /// Admissions allowed per window.
    pub limit: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl SourceBudget {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window_ms: window.as_millis() as u64,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Full engine configuration.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scheme and host of the court portal, e.g. `https://portal.example-court.gov`.
    pub base_url: String,
    pub sources: BTreeMap<String, SourceBudget>,
    pub request_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    /// How many times a denied admission is waited out before giving up on a strategy.
    pub admission_retries: u32,
    /// Longest single rate-limit wait the router accepts.
    pub max_admission_wait_ms: u64,
    pub refresh_concurrency: usize,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            SOURCE_COURT_INDEX.to_string(),
            SourceBudget::new(60, Duration::from_secs(60)),
        );
        sources.insert(
            SOURCE_ROA_SEARCH.to_string(),
            SourceBudget::new(20, Duration::from_secs(60)),
        );
        sources.insert(
            SOURCE_ODYSSEY_ROA.to_string(),
            SourceBudget::new(20, Duration::from_secs(60)),
        );

        Self {
            base_url: "https://portal.example-court.gov".to_string(),
            sources,
            request_timeout_ms: 15_000,
            cache_ttl_secs: 300,
            admission_retries: 1,
            max_admission_wait_ms: 65_000,
            refresh_concurrency: 4,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config document.
    pub fn from_json(text: &str) -> CourtResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| CourtError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the engine relies on.
    pub fn validate(&self) -> CourtResult<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| CourtError::Config(format!("invalid base_url {}: {e}", self.base_url)))?;
        if self.sources.is_empty() {
            return Err(CourtError::Config("no sources configured".to_string()));
        }
        for (key, budget) in &self.sources {
            if budget.limit == 0 || budget.window_ms == 0 {
                return Err(CourtError::Config(format!(
                    "source {key} needs a non-zero limit and window"
                )));
            }
        }
        if self.refresh_concurrency == 0 {
            return Err(CourtError::Config(
                "refresh_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn max_admission_wait(&self) -> Duration {
        Duration::from_millis(self.max_admission_wait_ms)
    }

    /// Worker-pool width for batch refresh.
    ///
    /// Capped at the tightest source limit so every worker hitting that
    /// source at once still fits inside one window.
    pub fn refresh_width(&self) -> usize {
        let tightest = self
            .sources
            .values()
            .map(|b| b.limit as usize)
            .min()
            .unwrap_or(1);
        self.refresh_concurrency.min(tightest).max(1)
    }
}
