//! Court Records: acquisition and normalization engine for a court portal that only speaks HTML.

pub mod cache;
pub mod client;
pub mod config;
pub mod extract;
pub mod http_client;
pub mod normalize;
pub mod rate_limiter;
pub mod refresher;
pub mod router;
pub mod strategy;
pub mod types;

pub use cache::{CacheStats, Fingerprint, ResultCache};
pub use client::{CourtRecordsClient, RateLimitReport};
pub use config::{EngineConfig, SourceBudget};
pub use extract::{extract, DocumentKind, Extraction, FailureReason, RawFields};
pub use http_client::{HttpClient, HttpResponse, Transport};
pub use normalize::{canonical_case_number, normalize, normalize_all};
pub use rate_limiter::{Admission, RateLimitState, RateLimiter};
pub use refresher::Refresher;
pub use router::SearchRouter;
pub use strategy::{Strategy, StrategyTable};
pub use types::*;
