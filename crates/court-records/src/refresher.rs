//! Batch refresh of tracked case numbers.
//!
//! Every case goes through the router on its own; one failure lands in the
//! report and never stops the rest of the batch. Workers come from a bounded
//! `buffer_unordered` pool sized so that all of them hitting the tightest
//! source at once still fits in that source's window.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::cache::ResultCache;
use crate::normalize::canonical_case_number;
use crate::router::SearchRouter;
use crate::types::{CaseQuery, CaseRecord, Lookup, RefreshFailure, RefreshReport};

pub struct Refresher {
    router: Arc<SearchRouter>,
    cache: Arc<ResultCache<Vec<CaseRecord>>>,
    width: usize,
}

impl Refresher {
    pub fn new(
        router: Arc<SearchRouter>,
        cache: Arc<ResultCache<Vec<CaseRecord>>>,
        width: usize,
    ) -> Self {
        Self {
            router,
            cache,
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Refresh every case in `case_numbers`.
    ///
    /// Numbers are canonicalised and de-duplicated first. Each case's cached
    /// entries are dropped so the refresh reads current upstream data. The
    /// same `deadline` applies to each case independently.
    pub async fn refresh<I, S>(&self, case_numbers: I, deadline: Option<Instant>) -> RefreshReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let numbers: BTreeSet<String> = case_numbers
            .into_iter()
            .map(|n| canonical_case_number(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();
        if numbers.is_empty() {
            return RefreshReport::default();
        }

        for number in &numbers {
            let dropped = self
                .cache
                .invalidate_where(|records| records.iter().any(|r| &r.case_number == number));
            if dropped > 0 {
                tracing::debug!("dropped {dropped} cached entries for {number}");
            }
        }

        tracing::info!(
            "refreshing {} tracked case(s) with {} worker(s)",
            numbers.len(),
            self.width
        );

        let outcomes: Vec<(String, Result<CaseRecord, RefreshFailure>)> = stream::iter(numbers)
            .map(|number| {
                let router = self.router.clone();
                async move {
                    let outcome = refresh_one(&router, &number, deadline).await;
                    (number, outcome)
                }
            })
            .buffer_unordered(self.width)
            .collect()
            .await;

        let mut report = RefreshReport::default();
        for (number, outcome) in outcomes {
            match outcome {
                Ok(record) => report.updated.push(record),
                Err(failure) => {
                    tracing::warn!("could not refresh {number}: {failure}");
                    report.failures.insert(number, failure);
                }
            }
        }
        report
            .updated
            .sort_by(|a, b| a.case_number.cmp(&b.case_number));

        tracing::info!(
            "refresh done: {} updated, {} failed",
            report.updated.len(),
            report.failures.len()
        );
        report
    }
}

async fn refresh_one(
    router: &SearchRouter,
    number: &str,
    deadline: Option<Instant>,
) -> Result<CaseRecord, RefreshFailure> {
    let query = CaseQuery::case_number(number).map_err(|e| RefreshFailure::Failed(e.to_string()))?;
    match router.lookup(&query, deadline).await {
        Ok(Lookup::Found(records)) => records
            .into_iter()
            .next()
            .ok_or(RefreshFailure::NotFound),
        Ok(Lookup::NotFound) => Err(RefreshFailure::NotFound),
        Err(e) => Err(RefreshFailure::Failed(e.to_string())),
    }
}
