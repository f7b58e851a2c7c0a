use crate::catalog::Catalog;
use crate::error::Result;
use crate::table::Panel;
use csv::WriterBuilder;
use serde_json::{Map, Value, json};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Prefix text cells that a spreadsheet would evaluate as a formula.
fn neutralize(s: &str) -> String {
    if s.starts_with(['=', '+', '-', '@']) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

fn cell_f64(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn cell_str(v: &Option<String>) -> String {
    v.as_deref().map(neutralize).unwrap_or_default()
}

/// Save a panel as CSV with header. Missing cells are empty.
pub fn save_csv<P: AsRef<Path>>(panel: &Panel, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let columns: Vec<String> = panel.columns().iter().map(|c| neutralize(c)).collect();
    wtr.write_record(&columns)?;
    for row in panel.rows() {
        let mut rec = vec![
            neutralize(&row.iso2c),
            neutralize(&row.country),
            row.year.to_string(),
        ];
        rec.extend(row.values.iter().map(|v| cell_f64(*v)));
        if panel.is_enriched() {
            match &row.meta {
                Some(m) => rec.extend([
                    neutralize(&m.iso3c),
                    cell_str(&m.region),
                    cell_str(&m.capital),
                    cell_f64(m.longitude),
                    cell_f64(m.latitude),
                    cell_str(&m.income),
                    cell_str(&m.lending),
                ]),
                None => rec.extend(std::iter::repeat_n(String::new(), 7)),
            }
        }
        wtr.write_record(&rec)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Panel rows as JSON objects keyed by column name.
pub fn panel_records(panel: &Panel) -> Vec<Value> {
    panel
        .rows()
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            obj.insert("iso2c".into(), json!(row.iso2c));
            obj.insert("country".into(), json!(row.country));
            obj.insert("year".into(), json!(row.year));
            for (name, v) in panel.indicators().iter().zip(&row.values) {
                obj.insert(name.clone(), json!(v));
            }
            if panel.is_enriched() {
                let m = row.meta.as_ref();
                obj.insert("iso3c".into(), json!(m.map(|m| &m.iso3c)));
                obj.insert("region".into(), json!(m.and_then(|m| m.region.as_ref())));
                obj.insert("capital".into(), json!(m.and_then(|m| m.capital.as_ref())));
                obj.insert("longitude".into(), json!(m.and_then(|m| m.longitude)));
                obj.insert("latitude".into(), json!(m.and_then(|m| m.latitude)));
                obj.insert("income".into(), json!(m.and_then(|m| m.income.as_ref())));
                obj.insert("lending".into(), json!(m.and_then(|m| m.lending.as_ref())));
            }
            Value::Object(obj)
        })
        .collect()
}

/// Save a panel as a pretty JSON array of row objects.
pub fn save_json<P: AsRef<Path>>(panel: &Panel, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(&panel_records(panel))?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Persist a catalog so it can be reused instead of rebuilding from the API.
pub fn save_catalog<P: AsRef<Path>>(catalog: &Catalog, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    serde_json::to_writer(&mut f, catalog)?;
    f.flush()?;
    Ok(())
}

pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let f = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(f))?)
}
