use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};

use crate::cell::cell_to_string;
use crate::error::OrderFormError;
use crate::normalize::normalize_name;

/// Name of the reference sheet holding the code lookup table.
pub const TAG_SHEET_NAME: &str = "タグ";

/// One row of the code lookup table, keyed by the normalized internal name.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    pub code: String,
    pub display_name: String,
    pub spec: String,
}

pub type TagMapping = HashMap<String, TagEntry>;

/// Load the tag reference table: normalized internal name → (code, display
/// name, spec).
///
/// Layout is fixed: one header row, then data to the last populated row with
/// columns A code, B display name, C spec, D internal name. Rows whose
/// internal name normalizes to empty are skipped, as are rows with an absent
/// code cell. A duplicate internal name overwrites the earlier entry
/// (last row wins), matching the historical output.
pub fn load_tag_mapping(path: &Path) -> Result<TagMapping, OrderFormError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| OrderFormError::WorkbookOpen {
            path: path.to_path_buf(),
            source: e,
        })?;

    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == TAG_SHEET_NAME) {
        return Err(OrderFormError::ReferenceSheetMissing {
            path: path.to_path_buf(),
            sheet: TAG_SHEET_NAME.to_string(),
            available: sheet_names,
        });
    }

    let range = workbook
        .worksheet_range(TAG_SHEET_NAME)
        .map_err(|e| OrderFormError::WorkbookRead {
            path: path.to_path_buf(),
            sheet: TAG_SHEET_NAME.to_string(),
            source: e,
        })?;

    Ok(tag_mapping_from_range(&range))
}

pub(crate) fn tag_mapping_from_range(range: &Range<Data>) -> TagMapping {
    let mut mapping = TagMapping::new();

    for row in range.rows().skip(1) {
        let internal_name = row.get(3).map(cell_to_string).unwrap_or_default();
        let key = normalize_name(&internal_name);
        if key.is_empty() {
            continue;
        }
        let code = match row.first() {
            None | Some(Data::Empty) => continue,
            Some(cell) => cell_to_string(cell),
        };

        mapping.insert(
            key,
            TagEntry {
                code,
                display_name: row.get(1).map(cell_to_string).unwrap_or_default(),
                spec: row.get(2).map(cell_to_string).unwrap_or_default(),
            },
        );
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{num, range_from_rows, text};
    use calamine::Data;

    fn header() -> Vec<Data> {
        vec![text("商品コード"), text("品名"), text("規格"), text("ハートミール食品名")]
    }

    #[test]
    fn padded_lookup_key_resolves_to_same_entry() {
        let range = range_from_rows(vec![
            header(),
            vec![text("C001"), text("赤字1号"), text("1kg"), text("鶏もも肉（正式）")],
        ]);
        let mapping = tag_mapping_from_range(&range);

        let entry = mapping
            .get(&normalize_name("鶏もも肉（正式）\u{3000}"))
            .expect("padded key should resolve");
        assert_eq!(
            entry,
            &TagEntry {
                code: "C001".to_string(),
                display_name: "赤字1号".to_string(),
                spec: "1kg".to_string(),
            }
        );
    }

    #[test]
    fn skips_rows_without_internal_name_or_code() {
        let range = range_from_rows(vec![
            header(),
            vec![text("C001"), text("a"), text("1kg"), Data::Empty],
            vec![Data::Empty, text("b"), text("2kg"), text("豚肉")],
            vec![text("C003"), text("c"), text("3kg"), text("牛肉")],
        ]);
        let mapping = tag_mapping_from_range(&range);

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["牛肉"].code, "C003");
    }

    #[test]
    fn duplicate_internal_name_last_row_wins() {
        let range = range_from_rows(vec![
            header(),
            vec![text("C001"), text("旧"), text("1kg"), text("鶏もも肉")],
            vec![text("C009"), text("新"), text("2kg"), text("鶏もも肉")],
        ]);
        let mapping = tag_mapping_from_range(&range);

        assert_eq!(mapping["鶏もも肉"].code, "C009");
        assert_eq!(mapping["鶏もも肉"].display_name, "新");
    }

    #[test]
    fn numeric_codes_render_without_decimal_point() {
        let range = range_from_rows(vec![
            header(),
            vec![num(1001.0), text("米"), Data::Empty, text("白米")],
        ]);
        let mapping = tag_mapping_from_range(&range);

        assert_eq!(mapping["白米"].code, "1001");
        assert_eq!(mapping["白米"].spec, "");
    }
}
