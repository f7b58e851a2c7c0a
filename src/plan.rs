use crate::models::WorkItem;

/// Expand indicators × countries into independent work items.
///
/// Indicator-major order. The "all" token is passed through as a single country;
/// the API expands it server-side.
pub fn plan(indicators: &[String], countries: &[String], start: i32, end: i32) -> Vec<WorkItem> {
    indicators
        .iter()
        .flat_map(|indicator| {
            countries.iter().map(move |country| WorkItem {
                indicator: indicator.clone(),
                country: country.clone(),
                start,
                end,
            })
        })
        .collect()
}
