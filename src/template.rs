use std::collections::BTreeMap;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};

use crate::cell::{cell_value_from, CellValue};
use crate::error::OrderFormError;

/// Name of the worksheet holding the order-form layout.
pub const TEMPLATE_SHEET_NAME: &str = "丸八ヒロタ発注書";

// Fixed layout of the template sheet, 1-based Excel coordinates.
// These must be preserved exactly for compatibility with historical files.
pub const FIXED_FIRST_ROW: u32 = 6;
pub const APPEND_START_ROW: u32 = 24;
pub const APPEND_MAX_ROWS: u32 = 7; // rows 24-30

pub const COL_USE_DATE: u16 = 1; // A
pub const COL_CODE: u16 = 2; // B
pub const COL_NAME: u16 = 4; // D (C carries a static marker, never written)
pub const COL_SPEC: u16 = 5; // E
pub const COL_RESIDENT: u16 = 6; // F
pub const COL_STAFF: u16 = 7; // G

/// Sparse worksheet contents, keyed by 1-based (row, column).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    cells: BTreeMap<(u32, u16), CellValue>,
}

impl SheetGrid {
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    pub fn clear(&mut self, row: u32, col: u16) {
        self.cells.remove(&(row, col));
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Cell rendered as text; empty string for blank cells.
    pub fn text(&self, row: u32, col: u16) -> String {
        match self.get(row, col) {
            Some(CellValue::Text(s)) => s.clone(),
            Some(CellValue::Number(n)) => n.to_string(),
            None => String::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(u32, u16), &CellValue)> {
        self.cells.iter()
    }
}

/// The template sheet parsed once into an immutable layout descriptor.
///
/// `base` is the template grid with all variable cells already cleared, so
/// every output sheet starts from the same clean state and usage dates can
/// never contaminate each other. `fixed_slots` maps each pre-provisioned
/// product code to its template row.
#[derive(Debug, Clone)]
pub struct TemplateLayout {
    pub base: SheetGrid,
    pub fixed_slots: BTreeMap<String, u32>,
}

impl TemplateLayout {
    pub fn from_range(range: &Range<Data>) -> Self {
        let mut base = SheetGrid::default();
        if let (Some(start), Some(end)) = (range.start(), range.end()) {
            for row in start.0..=end.0 {
                for col in start.1..=end.1 {
                    if let Some(value) = range.get_value((row, col)).and_then(cell_value_from) {
                        base.set(row + 1, (col + 1) as u16, value);
                    }
                }
            }
        }

        let fixed_slots = scan_fixed_slots(&base);
        clear_variable_cells(&mut base);

        TemplateLayout { base, fixed_slots }
    }
}

/// Load the template workbook and parse its layout sheet.
pub fn load_template(path: &Path) -> Result<TemplateLayout, OrderFormError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| OrderFormError::WorkbookOpen {
            path: path.to_path_buf(),
            source: e,
        })?;

    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == TEMPLATE_SHEET_NAME) {
        return Err(OrderFormError::TemplateSheetMissing {
            path: path.to_path_buf(),
            sheet: TEMPLATE_SHEET_NAME.to_string(),
            available: sheet_names,
        });
    }

    let range = workbook
        .worksheet_range(TEMPLATE_SHEET_NAME)
        .map_err(|e| OrderFormError::WorkbookRead {
            path: path.to_path_buf(),
            sheet: TEMPLATE_SHEET_NAME.to_string(),
            source: e,
        })?;

    Ok(TemplateLayout::from_range(&range))
}

/// Map product code → template row from the fixed block's code column.
///
/// The block must be contiguous: scanning starts at the first fixed row and
/// stops at the first blank code cell, even if later rows inside the range
/// still carry codes. Duplicate codes: last occurrence wins (plain insert),
/// replicating the source behavior.
fn scan_fixed_slots(grid: &SheetGrid) -> BTreeMap<String, u32> {
    let mut slots = BTreeMap::new();
    for row in fixed_rows(grid) {
        slots.insert(grid.text(row, COL_CODE).trim().to_string(), row);
    }
    slots
}

/// Rows of the contiguous fixed block, terminated by the first blank code.
fn fixed_rows(grid: &SheetGrid) -> Vec<u32> {
    let mut rows = Vec::new();
    let mut row = FIXED_FIRST_ROW;
    while row < APPEND_START_ROW {
        if grid.text(row, COL_CODE).trim().is_empty() {
            break;
        }
        rows.push(row);
        row += 1;
    }
    rows
}

/// Remove every variable cell from a template grid.
///
/// Fixed-slot rows keep their code/name/spec cells but lose usage date and
/// quantities; appendix rows lose everything except the static marker
/// column. Idempotent: clearing an already-cleared grid changes nothing.
pub(crate) fn clear_variable_cells(grid: &mut SheetGrid) {
    for row in fixed_rows(grid) {
        grid.clear(row, COL_USE_DATE);
        grid.clear(row, COL_RESIDENT);
        grid.clear(row, COL_STAFF);
    }

    for row in APPEND_START_ROW..APPEND_START_ROW + APPEND_MAX_ROWS {
        for col in [COL_USE_DATE, COL_CODE, COL_NAME, COL_SPEC, COL_RESIDENT, COL_STAFF] {
            grid.clear(row, col);
        }
    }
}
