use std::collections::BTreeMap;

use crate::aggregate::AggregatedItem;
use crate::normalize::normalize_name;
use crate::tags::TagMapping;

/// Quantities destined for one pre-provisioned template row.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotWrite {
    pub row: u32,
    pub qty_resident: f64,
    pub qty_staff: f64,
}

/// An item without a usable fixed slot, queued for the appendix area.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendixItem {
    pub item_name: String,
    pub spec: String,
    pub qty_resident: f64,
    pub qty_staff: f64,
}

/// Routing result for one usage date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutedDate {
    pub slot_writes: Vec<SlotWrite>,
    pub appendix: Vec<AppendixItem>,
}

/// Decide where each aggregated item lands.
///
/// Items with no quantity at all are skipped. An item whose normalized name
/// resolves to a tag whose code has a fixed template row becomes a slot
/// write; a known code without a provisioned row, or an unmapped name, is
/// queued for the appendix in input order. Nothing else is dropped.
pub fn route_items(
    items: &[AggregatedItem],
    tags: &TagMapping,
    fixed_slots: &BTreeMap<String, u32>,
) -> RoutedDate {
    let mut routed = RoutedDate::default();

    for item in items {
        if item.qty_resident == 0.0 && item.qty_staff == 0.0 {
            continue;
        }

        let name = normalize_name(&item.item_name);
        let slot_row = tags
            .get(&name)
            .and_then(|entry| fixed_slots.get(entry.code.as_str()));

        match slot_row {
            Some(&row) => routed.slot_writes.push(SlotWrite {
                row,
                qty_resident: item.qty_resident,
                qty_staff: item.qty_staff,
            }),
            None => routed.appendix.push(AppendixItem {
                item_name: name,
                spec: item.spec.clone(),
                qty_resident: item.qty_resident,
                qty_staff: item.qty_staff,
            }),
        }
    }

    routed
}
