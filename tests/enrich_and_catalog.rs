use wdi_rs::catalog::{self, SearchField, SearchResults, matching};
use wdi_rs::enrich::enrich;
use wdi_rs::models::{CountryMeta, SeriesMeta};
use wdi_rs::table::outer_join;
use wdi_rs::{Catalog, IndicatorRow, IndicatorTable, Panel, search};

fn panel() -> Panel {
    let rows = vec![
        IndicatorRow {
            iso2c: "US".into(),
            country: "United States".into(),
            value: Some(1.0),
            year: 2000,
        },
        IndicatorRow {
            iso2c: "XK".into(),
            country: "Kosovo".into(),
            value: Some(2.0),
            year: 2000,
        },
    ];
    outer_join(Panel::new(), IndicatorTable::new("A", rows))
}

fn us() -> CountryMeta {
    CountryMeta {
        iso3c: "USA".into(),
        iso2c: "US".into(),
        country: "United States".into(),
        region: Some("North America".into()),
        capital: Some("Washington D.C.".into()),
        longitude: Some(-77.032),
        latitude: Some(38.8895),
        income: Some("High income".into()),
        lending: Some("Not classified".into()),
    }
}

fn series(indicator: &str, name: &str, org: &str) -> SeriesMeta {
    SeriesMeta {
        indicator: indicator.into(),
        name: name.into(),
        description: format!("About {name}"),
        source_database: "World Development Indicators".into(),
        source_organization: org.into(),
    }
}

fn catalog() -> Catalog {
    Catalog {
        series: vec![
            series("NY.GDP.MKTP.CD", "GDP (current US$)", "World Bank"),
            series("NY.GDP.PCAP.KD", "GDP per capita (constant 2015 US$)", "World Bank"),
            series("SP.POP.TOTL", "Population, total", "UN Population Division"),
        ],
        countries: vec![us()],
    }
}

#[test]
fn enrich_keeps_every_row() {
    let enriched = enrich(panel(), &[us()]);
    assert_eq!(enriched.len(), 2);
    assert!(enriched.is_enriched());
    let us_row = enriched.rows().iter().find(|r| r.iso2c == "US").unwrap();
    assert_eq!(us_row.meta.as_ref().unwrap().iso3c, "USA");
    let xk_row = enriched.rows().iter().find(|r| r.iso2c == "XK").unwrap();
    assert!(xk_row.meta.is_none());
}

#[test]
fn enrich_twice_keeps_one_set_of_metadata_columns() {
    let once = enrich(panel(), &[us()]);
    let twice = enrich(once.clone(), &[us()]);
    assert_eq!(once.columns(), twice.columns());
    assert_eq!(once, twice);
    assert_eq!(
        once.columns(),
        [
            "iso2c", "country", "year", "A", "iso3c", "region", "capital", "longitude",
            "latitude", "income", "lending"
        ]
    );
}

#[test]
fn unenriched_panel_has_no_metadata_columns() {
    assert_eq!(panel().columns(), ["iso2c", "country", "year", "A"]);
}

#[test]
fn search_matches_name_case_insensitively() {
    let cat = catalog();
    let hits = matching(&cat, "gdp", SearchField::Name);
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|s| s.name.to_lowercase().contains("gdp")));
}

#[test]
fn search_is_restricted_to_one_field() {
    let cat = catalog();
    assert_eq!(matching(&cat, "pop", SearchField::Indicator).len(), 1);
    assert_eq!(matching(&cat, "sp.pop", SearchField::Name).len(), 0);
    assert_eq!(
        matching(&cat, "united", SearchField::SourceOrganization).len(),
        0
    );
    assert_eq!(matching(&cat, "UN Pop", SearchField::SourceOrganization).len(), 1);
    assert_eq!(matching(&cat, "about population", SearchField::Description).len(), 1);
}

#[test]
fn empty_query_returns_every_series() {
    let cat = catalog();
    match search(Some(&cat), "", SearchField::Name, false) {
        SearchResults::Full(rows) => assert_eq!(rows, cat.series),
        other => panic!("expected full rows, got {other:?}"),
    }
}

#[test]
fn short_form_returns_code_and_name() {
    let cat = catalog();
    match search(Some(&cat), "population", SearchField::Name, true) {
        SearchResults::Short(hits) => {
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].indicator, "SP.POP.TOTL");
            assert_eq!(hits[0].name, "Population, total");
        }
        other => panic!("expected short hits, got {other:?}"),
    }
}

#[test]
fn embedded_catalog_is_loaded_once_and_searchable() {
    let a = catalog::bundled();
    let b = catalog::bundled();
    assert!(std::ptr::eq(a, b));
    assert!(!a.series.is_empty());
    assert!(a.countries.iter().any(|c| c.iso2c == "US"));

    let hits = search(None, "gdp", SearchField::Name, true);
    assert!(!hits.is_empty());
}

#[test]
fn search_field_parses_from_text() {
    assert_eq!(
        "source_database".parse::<SearchField>().unwrap(),
        SearchField::SourceDatabase
    );
    assert_eq!(
        "sourceOrganization".parse::<SearchField>().unwrap(),
        SearchField::SourceOrganization
    );
    assert!("topic".parse::<SearchField>().is_err());
    assert_eq!(SearchField::Description.to_string(), "description");
}
