//! wdi_rs
//!
//! Fetch World Bank indicator series into a single country-year panel, and search
//! the indicator catalog. Pairs with the `wdi` CLI.
//!
//! ### Features
//! - One request per (indicator, country) pair, run on a bounded worker pool
//! - Failed pairs are reported, never fatal; the panel is built from what arrived
//! - Wide panel: one row per (country, year), one column per indicator
//! - Optional country metadata (region, income level, capital, coordinates)
//! - Catalog of series and countries with case-insensitive field search
//!
//! ### Example
//! ```no_run
//! use wdi_rs::{Client, PanelRequest};
//!
//! let client = Client::default();
//! let report = client.fetch_panel(
//!     &PanelRequest {
//!         countries: vec!["US".into(), "CA".into(), "MX".into()],
//!         indicators: vec!["gdp=NY.GDP.PCAP.KD".into(), "SP.POP.TOTL".into()],
//!         start: 2010,
//!         end: 2020,
//!         extra: true,
//!     },
//!     None,
//! )?;
//! if let Some(w) = report.warning() {
//!     eprintln!("{w}");
//! }
//! wdi_rs::storage::save_csv(&report.panel, "panel.csv")?;
//! # Ok::<(), wdi_rs::WdiError>(())
//! ```

pub mod api;
pub mod catalog;
pub mod collect;
pub mod config;
pub mod enrich;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod plan;
pub mod reduce;
pub mod sanitize;
pub mod storage;
pub mod table;

pub use api::{Client, SeriesSource};
pub use catalog::{Catalog, SearchField, SearchResults, build_catalog, search};
pub use collect::PairFailure;
pub use config::Config;
pub use error::{Result, WdiError};
pub use models::{CountryMeta, IndicatorRow, SeriesMeta, WorkItem};
pub use pipeline::{FetchReport, PanelRequest, fetch_panel};
pub use table::{IndicatorTable, Panel, PanelRow};
