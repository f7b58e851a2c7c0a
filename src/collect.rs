//! Fan-out over work items with per-pair failure isolation.
//!
//! Every item is fetched exactly once on a bounded `rayon` pool. A failure is
//! attributed to its item and kept as a value; it never aborts the batch.

use crate::api::SeriesSource;
use crate::error::{Result, WdiError};
use crate::models::WorkItem;
use crate::table::IndicatorTable;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

/// A single (indicator, country) fetch that did not produce a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairFailure {
    pub item: WorkItem,
    pub reason: String,
}

impl fmt::Display for PairFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

/// Tables that arrived plus the pairs that did not.
#[derive(Debug, Default)]
pub struct Collected {
    pub successes: Vec<IndicatorTable>,
    pub failures: Vec<PairFailure>,
}

/// Fetch every item, returning one result per item in input order.
pub fn fetch_each<S>(
    source: &S,
    items: &[WorkItem],
    concurrency: usize,
) -> Result<Vec<std::result::Result<IndicatorTable, PairFailure>>>
where
    S: SeriesSource + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()
        .map_err(|e| WdiError::Pool(e.to_string()))?;

    Ok(pool.install(|| {
        items
            .par_iter()
            .map(|item| match source.fetch_series(item) {
                Ok(table) => {
                    log::debug!("{item}: {} rows", table.rows.len());
                    Ok(table)
                }
                Err(e) => {
                    log::warn!("{item} failed: {e}");
                    Err(PairFailure {
                        item: item.clone(),
                        reason: e.to_string(),
                    })
                }
            })
            .collect()
    }))
}

/// Split per-item results into successes and failures.
pub fn partition(results: Vec<std::result::Result<IndicatorTable, PairFailure>>) -> Collected {
    let mut out = Collected::default();
    for r in results {
        match r {
            Ok(table) => out.successes.push(table),
            Err(failure) => out.failures.push(failure),
        }
    }
    out
}

pub fn collect_all<S>(source: &S, items: &[WorkItem], concurrency: usize) -> Result<Collected>
where
    S: SeriesSource + ?Sized,
{
    Ok(partition(fetch_each(source, items, concurrency)?))
}

/// One-line diagnostic naming every failed pair, e.g.
/// `"(NY.GDP.PCAP.KD - US), (SP.POP.TOTL - XX)"`. `None` when nothing failed.
pub fn failure_summary(failures: &[PairFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    Some(
        failures
            .iter()
            .map(|f| f.item.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    )
}
