//! Client configuration: API location, page size, timeouts and fan-out width.
//!
//! Defaults match the public World Bank Indicators API (v2). Any field can be
//! overridden from the environment with [`Config::from_env`]:
//!
//! | variable            | field          |
//! |---------------------|----------------|
//! | `WDI_BASE_URL`      | `base_url`     |
//! | `WDI_LANGUAGE`      | `language`     |
//! | `WDI_PER_PAGE`      | `per_page`     |
//! | `WDI_TIMEOUT_SECS`  | `timeout_secs` |
//! | `WDI_CONCURRENCY`   | `concurrency`  |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Languages the API serves localized country names in.
pub const LANGUAGES: [&str; 5] = ["en", "es", "fr", "ar", "zh"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub language: String,
    /// Fixed page size; large enough that one (indicator, country) request fits a single page.
    pub per_page: u32,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Upper bound on concurrent requests during a fan-out.
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldbank.org/v2".into(),
            language: "en".into(),
            per_page: 32_500,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            concurrency: 4,
            user_agent: concat!("wdi_rs/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Config {
    /// Defaults overridden by `WDI_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are skipped.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WDI_BASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                self.base_url = url.to_string();
            }
        }
        if let Some(lang) = lookup("WDI_LANGUAGE") {
            self = self.with_language(&lang);
        }
        override_parsed(&lookup, "WDI_PER_PAGE", &mut self.per_page);
        override_parsed(&lookup, "WDI_TIMEOUT_SECS", &mut self.timeout_secs);
        override_parsed(&lookup, "WDI_CONCURRENCY", &mut self.concurrency);
        self
    }

    /// Switch the response language; unsupported languages keep the current one.
    pub fn with_language(mut self, lang: &str) -> Self {
        let lang = lang.trim().to_ascii_lowercase();
        if LANGUAGES.contains(&lang.as_str()) {
            self.language = lang;
        } else {
            log::warn!("unsupported language {lang:?}, keeping {:?}", self.language);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Worker count for the collector, never zero.
    pub fn workers(&self) -> usize {
        self.concurrency.max(1)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => log::warn!("ignoring {key}={raw:?}: not a valid value"),
        }
    }
}
