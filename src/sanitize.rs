//! Input hygiene for indicator and country codes.
//!
//! Codes end up in URL paths, so anything outside a tight alphabet is stripped
//! before use: indicators keep `[A-Za-z0-9.]`, countries keep `[A-Za-z]`.

use crate::error::{Result, WdiError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Country token the API understands as "every economy".
pub const ALL_COUNTRIES: &str = "all";

static NOT_INDICATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9.]").expect("valid regex"));
static NOT_COUNTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z]").expect("valid regex"));
static NOT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._]").expect("valid regex"));

pub fn sanitize_indicator(code: &str) -> String {
    NOT_INDICATOR.replace_all(code, "").into_owned()
}

pub fn sanitize_country(code: &str) -> String {
    NOT_COUNTRY.replace_all(code, "").into_owned()
}

pub fn sanitize_label(label: &str) -> String {
    NOT_LABEL.replace_all(label, "").into_owned()
}

pub fn is_all(code: &str) -> bool {
    code.eq_ignore_ascii_case(ALL_COUNTRIES)
}

/// An indicator code with an optional output column label (`label=CODE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub code: String,
    pub label: Option<String>,
}

impl IndicatorSpec {
    /// Parse `CODE` or `label=CODE`, sanitizing both parts.
    pub fn parse(raw: &str) -> Self {
        let (label, code) = match raw.split_once('=') {
            Some((l, c)) => (Some(sanitize_label(l.trim())), c),
            None => (None, raw),
        };
        Self {
            code: sanitize_indicator(code.trim()),
            label: label.filter(|l| !l.is_empty()),
        }
    }

    /// Column name in the final panel.
    pub fn column(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.code)
    }
}

/// Sanitize, upper-case and de-duplicate country codes.
///
/// If any code is the "all" token the result collapses to that single token.
pub fn normalize_countries<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for code in raw {
        let code = sanitize_country(code.as_ref());
        if code.is_empty() {
            continue;
        }
        if is_all(&code) {
            return Ok(vec![ALL_COUNTRIES.to_string()]);
        }
        let code = code.to_ascii_uppercase();
        if seen.insert(code.clone()) {
            out.push(code);
        }
    }
    if out.is_empty() {
        return Err(WdiError::InvalidInput(
            "no usable country code after sanitization".into(),
        ));
    }
    Ok(out)
}

/// Parse and de-duplicate indicator specs by code, keeping the first occurrence.
pub fn normalize_indicators<S: AsRef<str>>(raw: &[S]) -> Result<Vec<IndicatorSpec>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for r in raw {
        let spec = IndicatorSpec::parse(r.as_ref());
        if spec.code.is_empty() {
            continue;
        }
        if seen.insert(spec.code.clone()) {
            out.push(spec);
        }
    }
    if out.is_empty() {
        return Err(WdiError::InvalidInput(
            "no usable indicator code after sanitization".into(),
        ));
    }
    Ok(out)
}

/// Fatal check on the requested year range.
pub fn validate_range(start: i32, end: i32) -> Result<()> {
    if start >= end {
        return Err(WdiError::InvalidInput(format!(
            "start year ({start}) must be strictly less than end year ({end})"
        )));
    }
    Ok(())
}
