//! Blocking client for the **World Bank Indicators API (v2)**.
//!
//! One request covers exactly one indicator and one country (or the `all` token):
//! `country/{code}/indicator/{code}?date={start}:{end}`. Responses are normalized
//! into an [`IndicatorTable`] by [`parse_indicator_response`], which is kept free of
//! I/O so it can be exercised on canned JSON.
//!
//! ### Notes
//! - The API sometimes serializes `per_page` as a **string**; we accept both string/number.
//! - A fixed large page size is used instead of pagination. If the server still reports
//!   more than one page, page 1 is kept and a warning is logged.
//! - Each request carries the client timeout from [`Config`]; no retries are attempted.
//!
//! Typical usage:
//! ```no_run
//! # use wdi_rs::{Client, WorkItem, SeriesSource};
//! let client = Client::default();
//! let table = client.fetch_series(&WorkItem {
//!     indicator: "NY.GDP.PCAP.KD".into(),
//!     country: "US".into(),
//!     start: 2010,
//!     end: 2020,
//! })?;
//! # Ok::<(), wdi_rs::WdiError>(())
//! ```
use crate::config::Config;
use crate::error::{Result, WdiError};
use crate::models::{
    CountryMeta, Entry, IndicatorRow, Meta, RawCountry, RawSeries, SeriesMeta, WorkItem,
};
use crate::table::IndicatorTable;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Anything that can produce one indicator table for one work item.
///
/// Implemented by [`Client`]; tests substitute canned sources.
pub trait SeriesSource: Sync {
    fn fetch_series(&self, item: &WorkItem) -> Result<IndicatorTable>;
}

#[derive(Debug, Clone)]
pub struct Client {
    pub config: Config,
    http: HttpClient,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Config::default()).expect("reqwest client build")
    }
}

// Allow -, _, . unescaped in codes (common for indicator ids)
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(part: &str) -> String {
    percent_encoding::utf8_percent_encode(part.trim(), SAFE).to_string()
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout()) // total request timeout
            .connect_timeout(config.connect_timeout())
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, http })
    }

    fn root(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.language
        )
    }

    /// URL of the data request for one work item.
    pub fn series_url(&self, item: &WorkItem) -> String {
        format!(
            "{}/country/{}/indicator/{}?format=json&date={}:{}&per_page={}",
            self.root(),
            enc(&item.country),
            enc(&item.indicator),
            item.start,
            item.end,
            self.config.per_page
        )
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self.http.get(url).send()?;
        if !resp.status().is_success() {
            return Err(WdiError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.json()?)
    }

    /// All indicator series known to the API.
    pub fn fetch_series_catalog(&self) -> Result<Vec<SeriesMeta>> {
        let url = format!(
            "{}/indicator?format=json&per_page={}",
            self.root(),
            self.config.per_page
        );
        log::info!("fetching series catalog");
        let records: Vec<RawSeries> =
            parse_catalog_response(self.get_json(&url)?, "series catalog")?;
        Ok(records.into_iter().map(SeriesMeta::from).collect())
    }

    /// All countries and aggregates known to the API.
    pub fn fetch_country_catalog(&self) -> Result<Vec<CountryMeta>> {
        let url = format!(
            "{}/country?format=json&per_page={}",
            self.root(),
            self.config.per_page
        );
        log::info!("fetching country catalog");
        let records: Vec<RawCountry> =
            parse_catalog_response(self.get_json(&url)?, "country catalog")?;
        Ok(records.into_iter().map(CountryMeta::from).collect())
    }
}

impl SeriesSource for Client {
    fn fetch_series(&self, item: &WorkItem) -> Result<IndicatorTable> {
        let url = self.series_url(item);
        log::debug!("GET {url}");
        let body = self.get_json(&url)?;
        parse_indicator_response(body, item)
    }
}

/// Split the `[meta, records]` envelope, surfacing the API's error payload.
///
/// Returns the meta object and the records array (`None` when the API sent `null`,
/// which it does for "no data").
fn split_envelope(v: Value) -> Result<(Value, Option<Vec<Value>>)> {
    let Value::Array(mut arr) = v else {
        return Err(WdiError::MalformedResponse(
            "not a top-level array".into(),
        ));
    };
    if arr.is_empty() {
        return Err(WdiError::MalformedResponse("empty array".into()));
    }
    // If first element has "message", surface API error.
    if let Some(msg) = arr[0].get("message") {
        return Err(WdiError::Api(msg.to_string()));
    }
    let records = if arr.len() > 1 {
        match arr.swap_remove(1) {
            Value::Array(items) => Some(items),
            Value::Null => None,
            other => {
                return Err(WdiError::MalformedResponse(format!(
                    "expected records array, got {other}"
                )));
            }
        }
    } else {
        None
    };
    Ok((arr.swap_remove(0), records))
}

fn parse_meta(meta: Value) -> Result<Meta> {
    serde_json::from_value(meta)
        .map_err(|e| WdiError::MalformedResponse(format!("parse meta: {e}")))
}

fn warn_if_truncated(what: &dyn fmt::Display, meta: &Meta) {
    if meta.pages > 1 {
        log::warn!(
            "{what}: response spans {} pages at per_page={}, keeping page {}",
            meta.pages,
            meta.per_page,
            meta.page
        );
    }
}

/// Decode the records of a catalog-endpoint response (`indicator`, `country`).
///
/// A `null` records array yields an empty list. Like the data endpoint, only the
/// first page is kept and a multi-page response is logged as truncated.
pub fn parse_catalog_response<T: DeserializeOwned>(v: Value, what: &str) -> Result<Vec<T>> {
    let (meta, records) = split_envelope(v)?;
    warn_if_truncated(&what, &parse_meta(meta)?);
    records
        .unwrap_or_default()
        .into_iter()
        .map(|r| serde_json::from_value(r).map_err(WdiError::from))
        .collect()
}

/// Normalize a data-endpoint response into an [`IndicatorTable`].
///
/// Values that are absent or non-numeric become missing. Rows whose date is not an
/// integer year, or falls outside `[item.start, item.end]`, are dropped.
pub fn parse_indicator_response(v: Value, item: &WorkItem) -> Result<IndicatorTable> {
    let (meta, records) = split_envelope(v)?;
    warn_if_truncated(item, &parse_meta(meta)?);

    let Some(records) = records else {
        log::debug!("{item}: no data");
        return Ok(IndicatorTable::new(&item.indicator, Vec::new()));
    };

    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let entry: Entry = serde_json::from_value(record)
            .map_err(|e| WdiError::MalformedResponse(format!("parse entry: {e}")))?;
        match IndicatorRow::from_entry(entry) {
            Some(row) if item.contains_year(row.year) => rows.push(row),
            Some(row) => log::debug!("{item}: dropping out-of-range year {}", row.year),
            None => log::debug!("{item}: dropping entry with unreadable date"),
        }
    }
    Ok(IndicatorTable::new(&item.indicator, rows))
}
