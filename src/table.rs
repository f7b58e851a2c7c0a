//! Typed tables and the two merge primitives the reducer is built from.
//!
//! An [`IndicatorTable`] carries exactly one indicator column whose name is fixed at
//! construction. A [`Panel`] is the wide result, keyed by [`JoinKey`]. Tables are
//! combined either by [`stack`] (row-wise, same indicator) or by [`outer_join`]
//! (column-wise on the key, no row ever dropped).

use crate::models::{CountryMeta, IndicatorRow};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Key columns shared by every table.
pub const KEY_COLUMNS: [&str; 3] = ["iso2c", "country", "year"];

/// Columns appended by the metadata enricher.
pub const METADATA_COLUMNS: [&str; 7] = [
    "iso3c",
    "region",
    "capital",
    "longitude",
    "latitude",
    "income",
    "lending",
];

/// True for names owned by the key or metadata columns, which an indicator column
/// must never take.
pub fn is_reserved_column(name: &str) -> bool {
    KEY_COLUMNS.contains(&name) || METADATA_COLUMNS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinKey {
    pub iso2c: String,
    pub country: String,
    pub year: i32,
}

impl JoinKey {
    pub fn of(row: &IndicatorRow) -> Self {
        Self {
            iso2c: row.iso2c.clone(),
            country: row.country.clone(),
            year: row.year,
        }
    }
}

/// One indicator's series for one or more countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    pub indicator: String,
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    pub fn new(indicator: impl Into<String>, rows: Vec<IndicatorRow>) -> Self {
        Self {
            indicator: indicator.into(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct country codes present, in first-seen order.
    pub fn countries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in &self.rows {
            if !out.contains(&r.iso2c.as_str()) {
                out.push(&r.iso2c);
            }
        }
        out
    }
}

/// Concatenate the rows of every table carrying `indicator`.
///
/// Tables for other indicators are ignored. A key seen twice keeps its first
/// non-missing value, so the result is collision-free.
pub fn stack<I>(indicator: &str, tables: I) -> IndicatorTable
where
    I: IntoIterator<Item = IndicatorTable>,
{
    let mut index: AHashMap<JoinKey, usize> = AHashMap::new();
    let mut rows: Vec<IndicatorRow> = Vec::new();
    for table in tables.into_iter().filter(|t| t.indicator == indicator) {
        for row in table.rows {
            match index.get(&JoinKey::of(&row)) {
                Some(&i) => {
                    if rows[i].value.is_none() {
                        rows[i].value = row.value;
                    }
                }
                None => {
                    index.insert(JoinKey::of(&row), rows.len());
                    rows.push(row);
                }
            }
        }
    }
    IndicatorTable::new(indicator, rows)
}

/// One panel row: the key, one cell per indicator column, and optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelRow {
    pub iso2c: String,
    pub country: String,
    pub year: i32,
    pub values: Vec<Option<f64>>,
    pub meta: Option<CountryMeta>,
}

impl PanelRow {
    fn empty(key: JoinKey, width: usize) -> Self {
        Self {
            iso2c: key.iso2c,
            country: key.country,
            year: key.year,
            values: vec![None; width],
            meta: None,
        }
    }

    pub fn key(&self) -> JoinKey {
        JoinKey {
            iso2c: self.iso2c.clone(),
            country: self.country.clone(),
            year: self.year,
        }
    }

    fn key_cmp(&self, other: &Self) -> Ordering {
        (self.iso2c.as_str(), self.country.as_str(), self.year).cmp(&(
            other.iso2c.as_str(),
            other.country.as_str(),
            other.year,
        ))
    }
}

/// Wide country-year table: one row per key, one column per indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Panel {
    indicators: Vec<String>,
    rows: Vec<PanelRow>,
    enriched: bool,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_enriched(&self) -> bool {
        self.enriched
    }

    /// Full column list: keys, indicator columns, then metadata when enriched.
    pub fn columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = KEY_COLUMNS.iter().map(|c| c.to_string()).collect();
        cols.extend(self.indicators.iter().cloned());
        if self.enriched {
            cols.extend(METADATA_COLUMNS.iter().map(|c| c.to_string()));
        }
        cols
    }

    pub fn column_index(&self, indicator: &str) -> Option<usize> {
        self.indicators.iter().position(|c| c == indicator)
    }

    /// Cell lookup by country code, year and indicator column.
    pub fn value(&self, iso2c: &str, year: i32, indicator: &str) -> Option<f64> {
        let col = self.column_index(indicator)?;
        self.rows
            .iter()
            .find(|r| r.iso2c == iso2c && r.year == year)
            .and_then(|r| r.values[col])
    }

    /// Rename an indicator column. Returns false if `from` is absent, or `to` is
    /// taken by another indicator or is a key/metadata column name.
    pub fn rename_indicator(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.column_index(from).is_some();
        }
        if is_reserved_column(to) || self.column_index(to).is_some() {
            return false;
        }
        match self.column_index(from) {
            Some(i) => {
                self.indicators[i] = to.to_string();
                true
            }
            None => false,
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [PanelRow] {
        &mut self.rows
    }

    pub(crate) fn set_enriched(&mut self) {
        self.enriched = true;
    }
}

/// Full outer join of `table` into `panel` on (iso2c, country, year).
///
/// Unmatched rows on either side survive with missing cells. If the panel already
/// has the table's indicator column, cells are filled where still missing.
pub fn outer_join(mut panel: Panel, table: IndicatorTable) -> Panel {
    let col = match panel.column_index(&table.indicator) {
        Some(i) => i,
        None => {
            panel.indicators.push(table.indicator);
            for row in &mut panel.rows {
                row.values.push(None);
            }
            panel.indicators.len() - 1
        }
    };
    let width = panel.indicators.len();

    let mut index: AHashMap<JoinKey, usize> = panel
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.key(), i))
        .collect();

    for row in table.rows {
        let key = JoinKey::of(&row);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                panel.rows.push(PanelRow::empty(key.clone(), width));
                index.insert(key, panel.rows.len() - 1);
                panel.rows.len() - 1
            }
        };
        let cell = &mut panel.rows[slot].values[col];
        if cell.is_none() {
            *cell = row.value;
        }
    }

    panel.rows.sort_by(PanelRow::key_cmp);
    panel
}
