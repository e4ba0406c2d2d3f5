//! Canonical case schema, lookup outcomes, and the engine error type.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder for string fields the upstream page did not show.
pub const UNKNOWN: &str = "Unknown";

/// One normalized court case.
///
/// Built fresh by the normalizer on every successful lookup and never patched
/// afterwards; a newer lookup replaces the record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub case_number: String,
    pub case_title: String,
    pub case_type: String,
    pub status: String,
    pub date_filed: Option<NaiveDate>,
    pub department: String,
    pub judge: String,
    /// Petitioner/plaintiff first, respondent/defendant second.
    pub parties: Vec<String>,
    /// Oldest first.
    pub register_of_actions: Vec<ActionEntry>,
    /// Soonest first.
    pub upcoming_events: Vec<EventEntry>,
    pub last_activity: Option<NaiveDate>,
    pub upgrade_options: Option<UpgradeOptions>,
    /// Strategy id that produced this record.
    pub source: String,
}

/// A register-of-actions docket line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
    pub date: Option<NaiveDate>,
    pub action: String,
    pub description: String,
    pub filed_by: String,
}

/// A scheduled hearing or other calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub date: Option<NaiveDate>,
    pub time: String,
    pub event_type: String,
    pub department: String,
    pub description: String,
}

/// Content the source tier withheld behind an upgrade wall.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeOptions {
    pub withheld: Vec<String>,
}

/// What a caller is searching by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    CaseNumber,
    Name,
}

/// A search request as it enters the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseQuery {
    pub text: String,
    pub kind: QueryKind,
}

impl CaseQuery {
    /// Build a query, rejecting blank input.
    pub fn new(text: &str, kind: QueryKind) -> CourtResult<Self> {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(CourtError::InvalidQuery("query text is empty".to_string()));
        }
        Ok(Self { text, kind })
    }

    pub fn case_number(text: &str) -> CourtResult<Self> {
        Self::new(text, QueryKind::CaseNumber)
    }

    pub fn name(text: &str) -> CourtResult<Self> {
        Self::new(text, QueryKind::Name)
    }

    /// The query text in the form used for cache fingerprints and matching.
    pub fn normalized(&self) -> String {
        match self.kind {
            QueryKind::CaseNumber => crate::normalize::canonical_case_number(&self.text),
            QueryKind::Name => self.text.to_lowercase(),
        }
    }
}

/// Result of a lookup that can legitimately find nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

/// Why a tracked case could not be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RefreshFailure {
    NotFound,
    Failed(String),
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFailure::NotFound => write!(f, "no matching case"),
            RefreshFailure::Failed(reason) => write!(f, "{reason}"),
        }
    }
}

/// Aggregated outcome of a tracked-case refresh.
///
/// `updated` is sorted by case number so the report does not depend on which
/// worker finished first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub updated: Vec<CaseRecord>,
    pub failures: BTreeMap<String, RefreshFailure>,
}

impl RefreshReport {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.failures.is_empty()
    }
}

/// Errors that can occur in the acquisition engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CourtError {
    #[error("Transient network error from {endpoint}: {message}")]
    TransientNetwork { endpoint: String, message: String },

    #[error("Upstream returned HTTP {status} for {endpoint}")]
    UpstreamHttp { endpoint: String, status: u16 },

    #[error("Extraction failed for {endpoint}: {reason}")]
    Extraction {
        endpoint: String,
        reason: crate::extract::FailureReason,
    },

    #[error("Normalization error: {0}")]
    Normalization(String),

    #[error("Rate limit exceeded for source {source_key} (retry after {retry_after_ms}ms)")]
    RateLimitExceeded {
        source_key: String,
        retry_after_ms: u64,
    },

    #[error("Deadline exceeded")]
    Timeout,

    #[error("Unknown rate-limit source: {0}")]
    UnknownSource(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CourtError {
    /// Whether the router should fall through to the next strategy.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CourtError::TransientNetwork { .. }
                | CourtError::UpstreamHttp { .. }
                | CourtError::Extraction { .. }
                | CourtError::RateLimitExceeded { .. }
        )
    }
}

/// Convenience result type.
pub type CourtResult<T> = Result<T, CourtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_collapses_whitespace() {
        let q = CaseQuery::name("  Smith   John ").unwrap();
        assert_eq!(q.text, "Smith John");
        assert_eq!(q.normalized(), "smith john");
    }

    #[test]
    fn test_blank_query_rejected() {
        assert!(matches!(
            CaseQuery::case_number("   "),
            Err(CourtError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_case_number_query_normalized() {
        let q = CaseQuery::case_number("22-fl-001581 c").unwrap();
        assert_eq!(q.normalized(), "22FL001581C");
    }

    #[test]
    fn test_record_serializes_camel_case_with_nulls() {
        let record = CaseRecord {
            case_number: "22FL001581C".to_string(),
            case_title: UNKNOWN.to_string(),
            case_type: UNKNOWN.to_string(),
            status: UNKNOWN.to_string(),
            date_filed: None,
            department: UNKNOWN.to_string(),
            judge: UNKNOWN.to_string(),
            parties: vec![],
            register_of_actions: vec![],
            upcoming_events: vec![],
            last_activity: None,
            upgrade_options: None,
            source: "case_index".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["caseNumber"], "22FL001581C");
        assert!(json.get("dateFiled").unwrap().is_null());
        assert_eq!(json["judge"], "Unknown");
    }

    #[test]
    fn test_transient_classification() {
        assert!(CourtError::UpstreamHttp {
            endpoint: "x".into(),
            status: 503
        }
        .is_transient());
        assert!(!CourtError::Normalization("missing".into()).is_transient());
        assert!(!CourtError::Timeout.is_transient());
    }
}
