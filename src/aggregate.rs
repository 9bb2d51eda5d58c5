use std::collections::BTreeMap;

use crate::ledger::LedgerRow;

/// Quantities for one (item, spec) pair on one usage date.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedItem {
    pub item_name: String,
    pub spec: String,
    pub qty_resident: f64,
    pub qty_staff: f64,
}

/// Sum ledger quantities for one usage date, grouped by (item name, spec).
///
/// Grouping goes through a `BTreeMap`, so the result depends only on the set
/// of rows, never on their order.
pub fn aggregate_for_date(rows: &[LedgerRow], use_date: &str) -> Vec<AggregatedItem> {
    let mut totals: BTreeMap<(String, String), (f64, f64)> = BTreeMap::new();

    for row in rows.iter().filter(|row| row.use_date == use_date) {
        let entry = totals
            .entry((row.item_name.clone(), row.spec.clone()))
            .or_insert((0.0, 0.0));
        entry.0 += row.qty_resident;
        entry.1 += row.qty_staff;
    }

    totals
        .into_iter()
        .map(|((item_name, spec), (qty_resident, qty_staff))| AggregatedItem {
            item_name,
            spec,
            qty_resident,
            qty_staff,
        })
        .collect()
}
