//! Panel reduction: many per-(indicator, country) tables into one wide panel.
//!
//! Two strategies, chosen by [`is_multi_country`]:
//! - [`join_all`]: fold every table into the panel with an outer join. Used for a
//!   single country or the "all" token, where each indicator arrives as one table.
//! - [`join_stacked`]: first [`stack`] the per-country tables of each indicator into
//!   one table, then outer-join across indicators.
//!
//! Both sort their input into requested-indicator order before merging, so the
//! result does not depend on fetch completion order.

use crate::table::{IndicatorTable, Panel, outer_join, stack};

/// True when more than one explicit country code was requested.
pub fn is_multi_country(countries: &[String]) -> bool {
    countries.len() > 1
}

pub fn reduce(successes: Vec<IndicatorTable>, countries: &[String], indicators: &[String]) -> Panel {
    if is_multi_country(countries) {
        join_stacked(successes, indicators)
    } else {
        join_all(successes, indicators)
    }
}

/// Pairwise outer join of every table, in requested-indicator order.
pub fn join_all(mut tables: Vec<IndicatorTable>, indicators: &[String]) -> Panel {
    let order = indicator_order(&tables, indicators);
    let rank = |t: &IndicatorTable| order.iter().position(|i| *i == t.indicator);
    tables.sort_by(|a, b| {
        rank(a)
            .cmp(&rank(b))
            .then_with(|| a.countries().cmp(&b.countries()))
    });
    tables.into_iter().fold(Panel::new(), outer_join)
}

/// Stack tables per indicator, then outer-join the per-indicator tables.
pub fn join_stacked(tables: Vec<IndicatorTable>, indicators: &[String]) -> Panel {
    let order = indicator_order(&tables, indicators);
    let mut remaining = tables;
    let mut panel = Panel::new();
    for indicator in &order {
        let (mine, rest): (Vec<IndicatorTable>, Vec<IndicatorTable>) = remaining
            .into_iter()
            .partition(|t| &t.indicator == indicator);
        remaining = rest;
        panel = outer_join(panel, stack(indicator, sort_by_country(mine)));
    }
    panel
}

/// Requested indicators that have at least one table, then any unrequested ones
/// in first-seen order.
fn indicator_order(tables: &[IndicatorTable], indicators: &[String]) -> Vec<String> {
    let mut order: Vec<String> = indicators
        .iter()
        .filter(|i| tables.iter().any(|t| &t.indicator == *i))
        .cloned()
        .collect();
    for t in tables {
        if !order.contains(&t.indicator) {
            order.push(t.indicator.clone());
        }
    }
    order
}

fn sort_by_country(mut tables: Vec<IndicatorTable>) -> Vec<IndicatorTable> {
    tables.sort_by(|a, b| a.countries().cmp(&b.countries()));
    tables
}
