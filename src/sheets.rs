use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::cell::CellValue;
use crate::router::{AppendixItem, RoutedDate};
use crate::template::{
    SheetGrid, TemplateLayout, APPEND_MAX_ROWS, APPEND_START_ROW, COL_NAME, COL_RESIDENT,
    COL_SPEC, COL_STAFF, COL_USE_DATE,
};

const SHEET_TITLE_MAX: usize = 31;

/// One output worksheet, ready to be written to the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSheet {
    pub title: String,
    pub grid: SheetGrid,
}

/// Make a title safe for Excel and unique within the workbook.
///
/// Characters Excel forbids (`: \ / * ? [ ]`) become `-`, surrounding
/// whitespace and quote characters are stripped, an empty result falls back
/// to `Sheet`, and the title is capped at 31 characters. Collisions get a
/// `_2`, `_3`, … suffix, truncating the base so the cap still holds.
pub fn sanitize_sheet_title(title: &str, existing: &HashSet<String>) -> String {
    static ILLEGAL: OnceLock<Regex> = OnceLock::new();
    let illegal = ILLEGAL.get_or_init(|| Regex::new(r"[:\\/*?\[\]]").unwrap());

    let mut safe = illegal.replace_all(title, "-").trim().to_string();
    if let Some(stripped) = safe.strip_prefix('\'') {
        safe = stripped.to_string();
    }
    if let Some(stripped) = safe.strip_suffix('\'') {
        safe = stripped.to_string();
    }
    if safe.is_empty() {
        safe = "Sheet".to_string();
    }
    safe = safe.chars().take(SHEET_TITLE_MAX).collect();

    let base = safe.clone();
    let mut counter = 2usize;
    while existing.contains(&safe) {
        let suffix = format!("_{counter}");
        safe = base
            .chars()
            .take(SHEET_TITLE_MAX - suffix.chars().count())
            .collect::<String>()
            + &suffix;
        counter += 1;
    }
    safe
}

/// Produce the worksheet(s) for one usage date.
///
/// The first sheet starts from the cleared template grid, receives the
/// fixed-slot writes and the first page of appendix items. When the routed
/// appendix exceeds the 7-row capacity, continuation sheets titled
/// `{date}_{n}ページ目` (n from 2) take the remaining items in order.
/// Every produced title is recorded in `existing`.
pub fn materialize_date_sheets(
    layout: &TemplateLayout,
    use_date: &str,
    routed: &RoutedDate,
    existing: &mut HashSet<String>,
) -> Vec<OrderSheet> {
    let mut sheets = Vec::new();

    let mut first = layout.base.clone();
    for write in &routed.slot_writes {
        first.set(write.row, COL_USE_DATE, CellValue::Text(use_date.to_string()));
        if write.qty_resident != 0.0 {
            first.set(write.row, COL_RESIDENT, CellValue::Number(write.qty_resident));
        }
        if write.qty_staff != 0.0 {
            first.set(write.row, COL_STAFF, CellValue::Number(write.qty_staff));
        }
    }
    sheets.push(OrderSheet {
        title: claim_title(use_date, existing),
        grid: first,
    });

    for (page_idx, chunk) in routed.appendix.chunks(APPEND_MAX_ROWS as usize).enumerate() {
        if page_idx > 0 {
            let title = claim_title(&format!("{use_date}_{}ページ目", page_idx + 1), existing);
            sheets.push(OrderSheet {
                title,
                grid: layout.base.clone(),
            });
        }
        let grid = &mut sheets.last_mut().expect("page sheet exists").grid;
        for (offset, item) in chunk.iter().enumerate() {
            write_append_row(grid, APPEND_START_ROW + offset as u32, use_date, item);
        }
    }

    sheets
}

fn claim_title(wanted: &str, existing: &mut HashSet<String>) -> String {
    let title = sanitize_sheet_title(wanted, existing);
    existing.insert(title.clone());
    title
}

/// Fill one appendix row. The code column stays blank: appendix items have
/// no provisioned slot, so no code is asserted for them.
fn write_append_row(grid: &mut SheetGrid, row: u32, use_date: &str, item: &AppendixItem) {
    grid.set(row, COL_USE_DATE, CellValue::Text(use_date.to_string()));
    grid.set(row, COL_NAME, CellValue::Text(item.item_name.clone()));
    grid.set(row, COL_SPEC, CellValue::Text(item.spec.clone()));
    if item.qty_resident != 0.0 {
        grid.set(row, COL_RESIDENT, CellValue::Number(item.qty_resident));
    }
    if item.qty_staff != 0.0 {
        grid.set(row, COL_STAFF, CellValue::Number(item.qty_staff));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::SlotWrite;
    use crate::template::COL_CODE;

    fn empty_layout() -> TemplateLayout {
        TemplateLayout {
            base: SheetGrid::default(),
            fixed_slots: Default::default(),
        }
    }

    fn appendix_items(n: usize) -> Vec<AppendixItem> {
        (0..n)
            .map(|i| AppendixItem {
                item_name: format!("品目{i}"),
                spec: "1kg".to_string(),
                qty_resident: (i + 1) as f64,
                qty_staff: 0.0,
            })
            .collect()
    }

    #[test]
    fn sanitizes_illegal_characters_and_quotes() {
        let existing = HashSet::new();
        assert_eq!(sanitize_sheet_title("3/23月", &existing), "3-23月");
        assert_eq!(sanitize_sheet_title("'a:b'", &existing), "a-b");
        assert_eq!(sanitize_sheet_title("  ", &existing), "Sheet");
    }

    #[test]
    fn truncates_to_31_characters() {
        let existing = HashSet::new();
        let long = "x".repeat(40);
        assert_eq!(sanitize_sheet_title(&long, &existing).chars().count(), 31);
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut existing = HashSet::new();
        existing.insert("3-23月".to_string());
        assert_eq!(sanitize_sheet_title("3/23月", &existing), "3-23月_2");
        existing.insert("3-23月_2".to_string());
        assert_eq!(sanitize_sheet_title("3/23月", &existing), "3-23月_3");
    }

    #[test]
    fn suffixed_collision_respects_length_cap() {
        let long = "x".repeat(31);
        let mut existing = HashSet::new();
        existing.insert(long.clone());
        let resolved = sanitize_sheet_title(&long, &existing);
        assert_eq!(resolved.chars().count(), 31);
        assert!(resolved.ends_with("_2"));
    }

    #[test]
    fn slot_write_fills_date_and_quantities() {
        let routed = RoutedDate {
            slot_writes: vec![SlotWrite {
                row: 6,
                qty_resident: 5.0,
                qty_staff: 2.0,
            }],
            appendix: vec![],
        };
        let mut existing = HashSet::new();
        let sheets = materialize_date_sheets(&empty_layout(), "3/23月", &routed, &mut existing);

        assert_eq!(sheets.len(), 1);
        let grid = &sheets[0].grid;
        assert_eq!(grid.get(6, COL_USE_DATE), Some(&CellValue::Text("3/23月".to_string())));
        assert_eq!(grid.get(6, COL_RESIDENT), Some(&CellValue::Number(5.0)));
        assert_eq!(grid.get(6, COL_STAFF), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn zero_staff_quantity_leaves_cell_blank() {
        let routed = RoutedDate {
            slot_writes: vec![SlotWrite {
                row: 6,
                qty_resident: 5.0,
                qty_staff: 0.0,
            }],
            appendix: vec![],
        };
        let mut existing = HashSet::new();
        let sheets = materialize_date_sheets(&empty_layout(), "3/23月", &routed, &mut existing);
        assert!(sheets[0].grid.get(6, COL_STAFF).is_none());
    }

    #[test]
    fn appendix_row_has_blank_code_column() {
        let routed = RoutedDate {
            slot_writes: vec![],
            appendix: vec![AppendixItem {
                item_name: "鶏もも肉".to_string(),
                spec: "1kg".to_string(),
                qty_resident: 5.0,
                qty_staff: 2.0,
            }],
        };
        let mut existing = HashSet::new();
        let sheets = materialize_date_sheets(&empty_layout(), "3/23月", &routed, &mut existing);

        let grid = &sheets[0].grid;
        assert_eq!(grid.get(24, COL_USE_DATE), Some(&CellValue::Text("3/23月".to_string())));
        assert!(grid.get(24, COL_CODE).is_none());
        assert_eq!(grid.get(24, COL_NAME), Some(&CellValue::Text("鶏もも肉".to_string())));
        assert_eq!(grid.get(24, COL_SPEC), Some(&CellValue::Text("1kg".to_string())));
        assert_eq!(grid.get(24, COL_RESIDENT), Some(&CellValue::Number(5.0)));
        assert_eq!(grid.get(24, COL_STAFF), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn seven_appendix_items_fit_one_sheet() {
        let routed = RoutedDate {
            slot_writes: vec![],
            appendix: appendix_items(7),
        };
        let mut existing = HashSet::new();
        let sheets = materialize_date_sheets(&empty_layout(), "3/23月", &routed, &mut existing);

        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].grid.text(30, COL_NAME), "品目6");
    }

    #[test]
    fn eighth_appendix_item_starts_a_continuation_sheet() {
        let routed = RoutedDate {
            slot_writes: vec![],
            appendix: appendix_items(8),
        };
        let mut existing = HashSet::new();
        let sheets = materialize_date_sheets(&empty_layout(), "3/23月", &routed, &mut existing);

        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].title, "3-23月");
        assert_eq!(sheets[1].title, "3-23月_2ページ目");
        assert_eq!(sheets[1].grid.text(24, COL_NAME), "品目7");
        assert!(sheets[1].grid.get(25, COL_NAME).is_none());
    }
}
