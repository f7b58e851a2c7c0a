//! End-to-end panel fetch: validate → plan → fetch each pair → reduce → enrich.

use crate::api::{Client, SeriesSource};
use crate::catalog::{self, Catalog};
use crate::collect::{PairFailure, collect_all, failure_summary};
use crate::enrich::enrich;
use crate::error::Result;
use crate::plan::plan;
use crate::reduce::reduce;
use crate::sanitize::{normalize_countries, normalize_indicators, validate_range};
use crate::table::{Panel, is_reserved_column};
use serde::{Deserialize, Serialize};

/// What to fetch.
///
/// `indicators` entries are codes or `label=CODE`; `countries` are ISO codes or `all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelRequest {
    pub countries: Vec<String>,
    pub indicators: Vec<String>,
    pub start: i32,
    pub end: i32,
    /// Attach country metadata (region, income level, …).
    #[serde(default)]
    pub extra: bool,
}

/// The assembled panel plus the pairs that were skipped.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub panel: Panel,
    pub failures: Vec<PairFailure>,
}

impl FetchReport {
    /// `"could not fetch: (A - US), (B - DE)"` when some pairs failed.
    pub fn warning(&self) -> Option<String> {
        failure_summary(&self.failures).map(|s| format!("could not fetch: {s}"))
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the whole pipeline against any [`SeriesSource`].
///
/// Fails only on bad input. Pair failures land in [`FetchReport::failures`]; if every
/// pair fails the panel is empty. With `extra`, metadata comes from `cache` or, when
/// absent, from the embedded catalog.
pub fn fetch_panel<S>(
    source: &S,
    request: &PanelRequest,
    cache: Option<&Catalog>,
    concurrency: usize,
) -> Result<FetchReport>
where
    S: SeriesSource + ?Sized,
{
    validate_range(request.start, request.end)?;
    let countries = normalize_countries(&request.countries)?;
    let specs = normalize_indicators(&request.indicators)?;
    let codes: Vec<String> = specs.iter().map(|s| s.code.clone()).collect();

    let items = plan(&codes, &countries, request.start, request.end);
    log::info!(
        "fetching {} indicator(s) x {} country code(s) = {} request(s), {}:{}",
        codes.len(),
        countries.len(),
        items.len(),
        request.start,
        request.end
    );

    let collected = collect_all(source, &items, concurrency)?;
    if let Some(summary) = failure_summary(&collected.failures) {
        log::warn!("could not fetch: {summary}");
    }

    let mut panel = reduce(collected.successes, &countries, &codes);
    for spec in &specs {
        let Some(label) = &spec.label else { continue };
        if panel.column_index(&spec.code).is_none() {
            continue;
        }
        if is_reserved_column(label) {
            log::warn!("ignoring label {label} for {}: reserved column name", spec.code);
        } else if !panel.rename_indicator(&spec.code, label) {
            log::warn!("cannot rename {} to {label}: column exists", spec.code);
        }
    }

    if request.extra {
        panel = enrich(panel, &catalog::resolve(cache).countries);
    }

    if panel.is_empty() {
        log::warn!("no data returned for the requested indicators and countries");
    } else {
        log::info!(
            "panel: {} rows x {} indicator column(s)",
            panel.len(),
            panel.indicators().len()
        );
    }

    Ok(FetchReport {
        panel,
        failures: collected.failures,
    })
}

impl Client {
    /// [`fetch_panel`] with this client's configured concurrency.
    pub fn fetch_panel(&self, request: &PanelRequest, cache: Option<&Catalog>) -> Result<FetchReport> {
        fetch_panel(self, request, cache, self.config.workers())
    }
}
