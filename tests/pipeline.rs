use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use wdi_rs::catalog::Catalog;
use wdi_rs::collect::{collect_all, failure_summary};
use wdi_rs::models::CountryMeta;
use wdi_rs::storage::panel_records;
use wdi_rs::{
    IndicatorRow, IndicatorTable, PanelRequest, Result, SeriesSource, WdiError, WorkItem,
    fetch_panel,
};

/// Canned per-(indicator, country) series. Pairs listed in `broken` fail like a dead
/// connection would; unknown pairs come back empty.
#[derive(Default)]
struct Stub {
    data: HashMap<(String, String), Vec<(i32, Option<f64>)>>,
    broken: BTreeSet<(String, String)>,
    calls: Mutex<Vec<WorkItem>>,
}

fn name_of(iso2c: &str) -> &'static str {
    match iso2c {
        "US" => "United States",
        "CA" => "Canada",
        "MX" => "Mexico",
        _ => "Somewhere",
    }
}

impl Stub {
    fn with(mut self, indicator: &str, country: &str, obs: &[(i32, Option<f64>)]) -> Self {
        self.data
            .insert((indicator.into(), country.into()), obs.to_vec());
        self
    }

    fn failing(mut self, indicator: &str, country: &str) -> Self {
        self.broken.insert((indicator.into(), country.into()));
        self
    }
}

impl SeriesSource for Stub {
    fn fetch_series(&self, item: &WorkItem) -> Result<IndicatorTable> {
        self.calls.lock().unwrap().push(item.clone());
        let key = (item.indicator.clone(), item.country.clone());
        if self.broken.contains(&key) {
            return Err(WdiError::MalformedResponse("connection reset".into()));
        }
        let rows: Vec<IndicatorRow> = self
            .data
            .get(&key)
            .map(|obs| {
                obs.iter()
                    .filter(|(y, _)| item.contains_year(*y))
                    .map(|&(year, value)| IndicatorRow {
                        iso2c: item.country.clone(),
                        country: name_of(&item.country).into(),
                        value,
                        year,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(IndicatorTable::new(&item.indicator, rows))
    }
}

fn request(countries: &[&str], indicators: &[&str], start: i32, end: i32) -> PanelRequest {
    PanelRequest {
        countries: countries.iter().map(|s| s.to_string()).collect(),
        indicators: indicators.iter().map(|s| s.to_string()).collect(),
        start,
        end,
        extra: false,
    }
}

#[test]
fn single_country_range_is_respected() {
    let stub = Stub::default().with(
        "NY.GNS.ICTR.GN.ZS",
        "US",
        &[(1998, Some(17.0)), (1999, Some(18.9)), (2000, Some(18.2)), (2001, Some(16.0))],
    );
    let report = fetch_panel(
        &stub,
        &request(&["US"], &["NY.GNS.ICTR.GN.ZS"], 1999, 2000),
        None,
        2,
    )
    .unwrap();
    let years: Vec<i32> = report.panel.rows().iter().map(|r| r.year).collect();
    assert_eq!(years, vec![1999, 2000]);
    assert!(report.panel.rows().iter().all(|r| r.iso2c == "US"));
    assert!(report.is_complete());
}

#[test]
fn one_failed_indicator_does_not_sink_the_batch() {
    let stub = Stub::default()
        .with("SP.POP.TOTL", "US", &[(2000, Some(282.2)), (2001, Some(285.0))])
        .failing("NY.GDP.PCAP.KD", "US");
    let report = fetch_panel(
        &stub,
        &request(&["US"], &["NY.GDP.PCAP.KD", "SP.POP.TOTL"], 2000, 2001),
        None,
        4,
    )
    .unwrap();

    assert_eq!(report.panel.len(), 2);
    assert_eq!(report.panel.indicators(), &["SP.POP.TOTL".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item.indicator, "NY.GDP.PCAP.KD");
    assert_eq!(report.failures[0].item.country, "US");
    assert!(report.failures[0].reason.contains("connection reset"));
    assert_eq!(
        report.warning().as_deref(),
        Some("could not fetch: (NY.GDP.PCAP.KD - US)")
    );
}

#[test]
fn every_pair_failing_yields_an_empty_panel() {
    let stub = Stub::default().failing("A", "US").failing("A", "CA");
    let report = fetch_panel(&stub, &request(&["US", "CA"], &["A"], 2000, 2001), None, 1).unwrap();
    assert!(report.panel.is_empty());
    assert_eq!(report.failures.len(), 2);
}

#[test]
fn bad_input_is_fatal_and_fetches_nothing() {
    let stub = Stub::default();
    let err = fetch_panel(&stub, &request(&["US"], &["A"], 2001, 2000), None, 1).unwrap_err();
    assert!(matches!(err, WdiError::InvalidInput(_)));
    let err = fetch_panel(&stub, &request(&["12"], &["A"], 2000, 2001), None, 1).unwrap_err();
    assert!(matches!(err, WdiError::InvalidInput(_)));
    assert!(stub.calls.lock().unwrap().is_empty());
}

#[test]
fn codes_are_sanitized_before_fetching() {
    let stub = Stub::default();
    fetch_panel(&stub, &request(&["u-s"], &["GDP;DROP"], 2000, 2001), None, 1).unwrap();
    let calls = stub.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].indicator, "GDPDROP");
    assert_eq!(calls[0].country, "US");
}

#[test]
fn multi_country_panel_has_no_duplicate_keys() {
    let stub = Stub::default()
        .with("A", "US", &[(2000, Some(1.0)), (2001, Some(2.0))])
        .with("A", "CA", &[(2000, Some(3.0))])
        .with("B", "US", &[(2001, Some(4.0))])
        .with("B", "MX", &[(2000, Some(5.0))]);
    let report = fetch_panel(
        &stub,
        &request(&["US", "CA", "MX"], &["A", "B"], 2000, 2001),
        None,
        3,
    )
    .unwrap();

    let keys: BTreeSet<(String, i32)> = report
        .panel
        .rows()
        .iter()
        .map(|r| (r.iso2c.clone(), r.year))
        .collect();
    assert_eq!(keys.len(), report.panel.len());
    assert_eq!(report.panel.len(), 4);
    assert_eq!(report.panel.value("US", 2001, "A"), Some(2.0));
    assert_eq!(report.panel.value("US", 2001, "B"), Some(4.0));
    assert_eq!(report.panel.value("MX", 2000, "A"), None);
    assert_eq!(stub.calls.lock().unwrap().len(), 6);
}

#[test]
fn reordered_inputs_give_the_same_rows() {
    let stub = Stub::default()
        .with("A", "US", &[(2000, Some(1.0))])
        .with("A", "CA", &[(2001, Some(2.0))])
        .with("B", "CA", &[(2000, Some(3.0))]);
    let one = fetch_panel(&stub, &request(&["US", "CA"], &["A", "B"], 2000, 2001), None, 4)
        .unwrap()
        .panel;
    let two = fetch_panel(&stub, &request(&["CA", "US"], &["B", "A"], 2000, 2001), None, 1)
        .unwrap()
        .panel;

    let cols = |p: &wdi_rs::Panel| p.columns().into_iter().collect::<BTreeSet<_>>();
    assert_eq!(cols(&one), cols(&two));
    assert_eq!(one.len(), two.len());
    for r in one.rows() {
        for ind in ["A", "B"] {
            assert_eq!(one.value(&r.iso2c, r.year, ind), two.value(&r.iso2c, r.year, ind));
        }
    }
}

#[test]
fn labels_rename_columns() {
    let stub = Stub::default().with("NY.GDP.PCAP.KD", "US", &[(2000, Some(45_000.0))]);
    let report = fetch_panel(
        &stub,
        &request(&["US"], &["gdp=NY.GDP.PCAP.KD"], 2000, 2001),
        None,
        1,
    )
    .unwrap();
    assert_eq!(report.panel.indicators(), &["gdp".to_string()]);
    assert_eq!(report.panel.value("US", 2000, "gdp"), Some(45_000.0));
}

#[test]
fn labels_cannot_shadow_key_or_metadata_columns() {
    let stub = Stub::default()
        .with("SP.POP.TOTL", "US", &[(2000, Some(42.5))])
        .with("NY.GDP.PCAP.KD", "US", &[(2000, Some(45_000.0))]);
    let mut req = request(
        &["US"],
        &["year=SP.POP.TOTL", "region=NY.GDP.PCAP.KD"],
        2000,
        2001,
    );
    req.extra = true;
    let panel = fetch_panel(&stub, &req, None, 1).unwrap().panel;

    assert_eq!(
        panel.indicators(),
        &["SP.POP.TOTL".to_string(), "NY.GDP.PCAP.KD".to_string()]
    );
    let cols = panel.columns();
    let unique: BTreeSet<&String> = cols.iter().collect();
    assert_eq!(unique.len(), cols.len(), "duplicate columns: {cols:?}");

    let records = panel_records(&panel);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["year"], serde_json::json!(2000));
    assert_eq!(records[0]["SP.POP.TOTL"], serde_json::json!(42.5));
    assert_eq!(records[0]["region"], serde_json::json!("North America"));
}

#[test]
fn extra_uses_the_supplied_catalog() {
    let stub = Stub::default().with("A", "US", &[(2000, Some(1.0))]);
    let catalog = Catalog {
        series: vec![],
        countries: vec![CountryMeta {
            iso3c: "USA".into(),
            iso2c: "US".into(),
            country: "United States".into(),
            region: Some("Test Region".into()),
            capital: None,
            longitude: None,
            latitude: None,
            income: Some("High income".into()),
            lending: None,
        }],
    };
    let mut req = request(&["US"], &["A"], 2000, 2001);
    req.extra = true;
    let report = fetch_panel(&stub, &req, Some(&catalog), 1).unwrap();
    assert!(report.panel.is_enriched());
    let meta = report.panel.rows()[0].meta.as_ref().unwrap();
    assert_eq!(meta.region.as_deref(), Some("Test Region"));
}

#[test]
fn extra_falls_back_to_the_embedded_catalog() {
    let stub = Stub::default().with("A", "MX", &[(2000, Some(1.0))]);
    let mut req = request(&["MX"], &["A"], 2000, 2001);
    req.extra = true;
    let report = fetch_panel(&stub, &req, None, 1).unwrap();
    let meta = report.panel.rows()[0].meta.as_ref().unwrap();
    assert_eq!(meta.iso3c, "MEX");
}

#[test]
fn collector_attributes_each_failure_to_its_pair() {
    let stub = Stub::default()
        .with("A", "US", &[(2000, Some(1.0))])
        .failing("A", "CA")
        .failing("B", "US");
    let items: Vec<WorkItem> = [("A", "US"), ("A", "CA"), ("B", "US")]
        .iter()
        .map(|(i, c)| WorkItem {
            indicator: i.to_string(),
            country: c.to_string(),
            start: 2000,
            end: 2001,
        })
        .collect();
    let collected = collect_all(&stub, &items, 8).unwrap();
    assert_eq!(collected.successes.len(), 1);
    assert_eq!(collected.failures.len(), 2);
    assert_eq!(
        failure_summary(&collected.failures).as_deref(),
        Some("(A - CA), (B - US)")
    );
    assert_eq!(failure_summary(&[]), None);
}
