//! Discovery tables: the series catalog and country metadata.
//!
//! A [`Catalog`] is built once from the API with [`build_catalog`] and then owned and
//! persisted by the caller (see [`crate::storage::save_catalog`]). When no catalog is
//! supplied, a small catalog embedded in the binary is used; it is parsed on first
//! access and never mutated afterwards.

use crate::api::Client;
use crate::error::{Result, WdiError};
use crate::models::{CountryMeta, SeriesMeta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub series: Vec<SeriesMeta>,
    pub countries: Vec<CountryMeta>,
}

/// Fetch both reference tables from the API.
pub fn build_catalog(client: &Client) -> Result<Catalog> {
    let series = client.fetch_series_catalog()?;
    let countries = client.fetch_country_catalog()?;
    log::info!(
        "catalog: {} series, {} countries",
        series.len(),
        countries.len()
    );
    Ok(Catalog { series, countries })
}

static BUNDLED: OnceLock<Catalog> = OnceLock::new();

/// The embedded fallback catalog.
pub fn bundled() -> &'static Catalog {
    BUNDLED.get_or_init(|| {
        serde_json::from_str(include_str!("../data/catalog.json"))
            .expect("embedded catalog is valid json")
    })
}

/// Caller's catalog if given, otherwise the embedded one.
pub fn resolve(cache: Option<&Catalog>) -> &Catalog {
    cache.unwrap_or_else(|| bundled())
}

/// Column of the series catalog a search is restricted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    Indicator,
    #[default]
    Name,
    Description,
    SourceDatabase,
    SourceOrganization,
}

impl SearchField {
    fn of<'a>(&self, s: &'a SeriesMeta) -> &'a str {
        match self {
            SearchField::Indicator => &s.indicator,
            SearchField::Name => &s.name,
            SearchField::Description => &s.description,
            SearchField::SourceDatabase => &s.source_database,
            SearchField::SourceOrganization => &s.source_organization,
        }
    }
}

impl FromStr for SearchField {
    type Err = WdiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "indicator" => Ok(SearchField::Indicator),
            "name" => Ok(SearchField::Name),
            "description" => Ok(SearchField::Description),
            "sourcedatabase" => Ok(SearchField::SourceDatabase),
            "sourceorganization" => Ok(SearchField::SourceOrganization),
            other => Err(WdiError::InvalidInput(format!(
                "unknown search field: {other}"
            ))),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchField::Indicator => "indicator",
            SearchField::Name => "name",
            SearchField::Description => "description",
            SearchField::SourceDatabase => "source_database",
            SearchField::SourceOrganization => "source_organization",
        };
        f.write_str(s)
    }
}

/// Short search hit: code and name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesHit {
    pub indicator: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchResults {
    Short(Vec<SeriesHit>),
    Full(Vec<SeriesMeta>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Short(v) => v.len(),
            SearchResults::Full(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Series whose `field` contains `query`, ignoring case. An empty query matches all.
pub fn matching<'a>(catalog: &'a Catalog, query: &str, field: SearchField) -> Vec<&'a SeriesMeta> {
    let needle = query.trim().to_lowercase();
    catalog
        .series
        .iter()
        .filter(|s| needle.is_empty() || field.of(s).to_lowercase().contains(&needle))
        .collect()
}

/// Search the catalog (or the embedded one when `cache` is `None`).
pub fn search(
    cache: Option<&Catalog>,
    query: &str,
    field: SearchField,
    short: bool,
) -> SearchResults {
    let hits = matching(resolve(cache), query, field);
    if short {
        SearchResults::Short(
            hits.into_iter()
                .map(|s| SeriesHit {
                    indicator: s.indicator.clone(),
                    name: s.name.clone(),
                })
                .collect(),
        )
    } else {
        SearchResults::Full(hits.into_iter().cloned().collect())
    }
}
