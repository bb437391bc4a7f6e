//! Exchange-column bookkeeping for the funding matrix.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::types::ExchangeColumn;

/// Distinct exchanges, sorted.
pub fn exchanges(columns: &[ExchangeColumn]) -> Vec<String> {
    columns
        .iter()
        .map(|c| c.exchange.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Columns belonging to the selected exchanges; all columns if none are
/// selected.
pub fn filter_columns<'a>(columns: &'a [ExchangeColumn], selected: &[String]) -> Vec<&'a ExchangeColumn> {
    columns
        .iter()
        .filter(|c| selected.is_empty() || selected.contains(&c.exchange))
        .collect()
}

/// Market keys allowed by an exchange selection.
///
/// `None` when nothing is selected, meaning every market is allowed.
pub fn allowed_keys(columns: &[ExchangeColumn], selected: &[String]) -> Option<HashSet<String>> {
    if selected.is_empty() {
        return None;
    }
    Some(
        filter_columns(columns, selected)
            .into_iter()
            .map(|c| c.column_key.clone())
            .collect(),
    )
}

/// Exchanges that list the token under more than one quote asset; the quote
/// has to be shown next to their rates to tell the columns apart.
pub fn multi_quote_exchanges(columns: &[ExchangeColumn]) -> HashSet<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for col in columns {
        *counts.entry(col.exchange.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(ex, _)| ex.to_string())
        .collect()
}
