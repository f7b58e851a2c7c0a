use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Metadata section returned by the API (position 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub page: u32,
    pub pages: u32,
    /// Some responses encode `per_page` as a string, others as a number.
    /// Accept both and normalize to `u32`.
    #[serde(deserialize_with = "de_u32_from_string_or_number")]
    pub per_page: u32,
    #[serde(deserialize_with = "de_u32_from_string_or_number")]
    pub total: u32,
}

/// Serde helper: parse `u32` from either a JSON number or a string.
fn de_u32_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct U32Visitor;

    impl<'de> Visitor<'de> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a string or integer representing a non-negative number")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(v).map_err(E::custom)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(v).map_err(|_| E::custom("negative or oversized value for u32"))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim().parse::<u32>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(U32Visitor)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeName {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value: String,
}

/// Raw observation from the data endpoint (position 1 array).
///
/// `value` and `date` are kept loose: the API emits numbers, numeric strings,
/// `null`, and occasionally period labels like `"2001Q1"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub indicator: CodeName,
    pub country: CodeName,
    #[serde(default)]
    pub countryiso3code: Option<String>,
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub value: Option<Value>,
}

/// One normalized observation: a single (country, year) value of one indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorRow {
    pub iso2c: String,
    pub country: String,
    pub value: Option<f64>,
    pub year: i32,
}

impl IndicatorRow {
    /// Normalize a raw entry. Returns `None` when the year cannot be read.
    pub fn from_entry(e: Entry) -> Option<Self> {
        let year = coerce_year(&e.date)?;
        Some(Self {
            iso2c: e.country.id.trim().to_string(),
            country: e.country.value.trim().to_string(),
            value: e.value.as_ref().and_then(coerce_value),
            year,
        })
    }
}

/// Numeric coercion: numbers and numeric strings pass, everything else is missing.
pub fn coerce_value(v: &Value) -> Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

/// Year coercion: integers or strings that are exactly an integer.
pub fn coerce_year(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// The unit of independent fetching and of failure attribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub indicator: String,
    pub country: String,
    pub start: i32,
    pub end: i32,
}

impl WorkItem {
    pub fn contains_year(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} - {})", self.indicator, self.country)
    }
}

/// Raw record of the `/indicator` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSeries {
    pub id: String,
    #[serde(default, alias = "value")]
    pub name: String,
    #[serde(default)]
    pub source: Option<CodeName>,
    #[serde(default, rename = "sourceNote")]
    pub source_note: Option<String>,
    #[serde(default, rename = "sourceOrganization")]
    pub source_organization: Option<String>,
}

/// One row of the series catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub indicator: String,
    pub name: String,
    pub description: String,
    pub source_database: String,
    pub source_organization: String,
}

impl From<RawSeries> for SeriesMeta {
    fn from(r: RawSeries) -> Self {
        Self {
            indicator: r.id,
            name: r.name.trim().to_string(),
            description: r.source_note.unwrap_or_default().trim().to_string(),
            source_database: r.source.map(|s| s.value.trim().to_string()).unwrap_or_default(),
            source_organization: r
                .source_organization
                .unwrap_or_default()
                .trim()
                .to_string(),
        }
    }
}

/// Raw record of the `/country` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCountry {
    pub id: String,
    #[serde(rename = "iso2Code")]
    pub iso2_code: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<CodeName>,
    #[serde(default, rename = "capitalCity")]
    pub capital_city: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default, rename = "incomeLevel")]
    pub income_level: Option<CodeName>,
    #[serde(default, rename = "lendingType")]
    pub lending_type: Option<CodeName>,
}

/// One row of the country metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMeta {
    pub iso3c: String,
    pub iso2c: String,
    pub country: String,
    pub region: Option<String>,
    pub capital: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub income: Option<String>,
    pub lending: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl From<RawCountry> for CountryMeta {
    fn from(r: RawCountry) -> Self {
        let coord = |s: Option<String>| non_empty(s).and_then(|s| s.parse::<f64>().ok());
        Self {
            iso3c: r.id.trim().to_string(),
            iso2c: r.iso2_code.trim().to_string(),
            country: r.name.trim().to_string(),
            region: non_empty(r.region.map(|c| c.value)),
            capital: non_empty(r.capital_city),
            longitude: coord(r.longitude),
            latitude: coord(r.latitude),
            income: non_empty(r.income_level.map(|c| c.value)),
            lending: non_empty(r.lending_type.map(|c| c.value)),
        }
    }
}
