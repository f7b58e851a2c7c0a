use crate::models::CountryMeta;
use crate::table::Panel;
use ahash::AHashMap;

/// Left join of country metadata onto the panel by ISO-2 code.
///
/// Every row is kept. Rows without a match get `meta = None`. Re-applying replaces
/// the previous attachment, so the column set does not grow.
pub fn enrich(mut panel: Panel, countries: &[CountryMeta]) -> Panel {
    let by_iso2: AHashMap<&str, &CountryMeta> = countries
        .iter()
        .filter(|c| !c.iso2c.is_empty())
        .map(|c| (c.iso2c.as_str(), c))
        .collect();

    let mut unmatched = 0usize;
    for row in panel.rows_mut() {
        row.meta = by_iso2.get(row.iso2c.as_str()).map(|c| (*c).clone());
        if row.meta.is_none() {
            unmatched += 1;
        }
    }
    if unmatched > 0 {
        log::debug!("{unmatched} panel rows without country metadata");
    }
    panel.set_enriched();
    panel
}
