//! Upstream endpoint catalog.
//!
//! A strategy is one concrete (endpoint, query parameter, page shape)
//! combination. The table holds them in priority order per query kind.

use serde::Serialize;

use crate::cache::Fingerprint;
use crate::config::{SOURCE_COURT_INDEX, SOURCE_ODYSSEY_ROA, SOURCE_ROA_SEARCH};
use crate::extract::DocumentKind;
use crate::types::{CaseQuery, QueryKind};

/// One way of asking the portal for a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strategy {
    /// Stable identifier, used in fingerprints and as `CaseRecord::source`.
    pub id: &'static str,
    /// Rate-limit source key charged for each fetch.
    pub source: &'static str,
    /// Path on the portal, appended to the configured base URL.
    pub path: &'static str,
    /// Query-string parameter carrying the search text.
    pub param: &'static str,
    pub kind: DocumentKind,
}

impl Strategy {
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }

    /// Query parameters sent upstream.
    pub fn params(&self, query: &CaseQuery) -> Vec<(String, String)> {
        let value = match query.kind {
            QueryKind::CaseNumber => query.normalized(),
            QueryKind::Name => query.text.clone(),
        };
        vec![(self.param.to_string(), value)]
    }

    /// Cache key for this strategy and query.
    pub fn fingerprint(&self, query: &CaseQuery) -> Fingerprint {
        Fingerprint::new(self.id, &[(self.param, &query.normalized())])
    }
}

pub const CASE_INDEX: Strategy = Strategy {
    id: "case_index",
    source: SOURCE_COURT_INDEX,
    path: "/CaseIndex/Search",
    param: "caseNumber",
    kind: DocumentKind::CaseDetail,
};

pub const ROA_SEARCH: Strategy = Strategy {
    id: "roa_search",
    source: SOURCE_ROA_SEARCH,
    path: "/ROA/CaseSearch",
    param: "caseNumber",
    kind: DocumentKind::CaseDetail,
};

pub const ODYSSEY_ROA: Strategy = Strategy {
    id: "odyssey_roa",
    source: SOURCE_ODYSSEY_ROA,
    path: "/OdysseyROA/Search",
    param: "caseNumber",
    kind: DocumentKind::CaseDetail,
};

pub const PARTY_NAME: Strategy = Strategy {
    id: "party_name",
    source: SOURCE_COURT_INDEX,
    path: "/CaseIndex/PartySearch",
    param: "partyName",
    kind: DocumentKind::SearchResults,
};

pub const ROA_PARTY: Strategy = Strategy {
    id: "roa_party",
    source: SOURCE_ROA_SEARCH,
    path: "/ROA/PartySearch",
    param: "partyName",
    kind: DocumentKind::SearchResults,
};

/// Strategies in priority order, per query kind.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    case_number: Vec<Strategy>,
    name: Vec<Strategy>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            case_number: vec![CASE_INDEX, ROA_SEARCH, ODYSSEY_ROA],
            name: vec![PARTY_NAME, ROA_PARTY],
        }
    }
}

impl StrategyTable {
    pub fn new(case_number: Vec<Strategy>, name: Vec<Strategy>) -> Self {
        Self { case_number, name }
    }

    pub fn for_kind(&self, kind: QueryKind) -> &[Strategy] {
        match kind {
            QueryKind::CaseNumber => &self.case_number,
            QueryKind::Name => &self.name,
        }
    }

    /// Every strategy, case-number ones first.
    pub fn all(&self) -> impl Iterator<Item = &Strategy> {
        self.case_number.iter().chain(self.name.iter())
    }
}
