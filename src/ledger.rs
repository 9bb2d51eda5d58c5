use std::fmt;
use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};

use crate::cell::{cell_to_f64, cell_to_string};
use crate::columns::resolve_column;
use crate::error::OrderFormError;

/// Default supplier the ledger is restricted to.
pub const DEFAULT_SUPPLIER: &str = "丸八ヒロタ";

const COL_SUPPLIER: &str = "仕入先";
const COL_USE_DATE: &str = "使用日";
const COL_FOOD_NAME: &str = "食品名";
const COL_SPEC: &str = "換算値";

/// Which facility's quantity columns and output file to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilityMode {
    /// 特養 (nursing facility): resident and staff quantity columns.
    Tokuyou,
    /// ユーハウス (residential care house): resident column only.
    Yuhouse,
}

impl FacilityMode {
    /// Suffix used in the fixed output file names.
    pub fn output_suffix(self) -> &'static str {
        match self {
            FacilityMode::Tokuyou => "特養",
            FacilityMode::Yuhouse => "ユーハウス",
        }
    }
}

impl FromStr for FacilityMode {
    type Err = OrderFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tokuyou" => Ok(FacilityMode::Tokuyou),
            "yuhouse" => Ok(FacilityMode::Yuhouse),
            other => Err(OrderFormError::InvalidFacilityMode(other.to_string())),
        }
    }
}

impl fmt::Display for FacilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityMode::Tokuyou => write!(f, "tokuyou"),
            FacilityMode::Yuhouse => write!(f, "yuhouse"),
        }
    }
}

/// One usable ledger row: the target supplier, with a non-empty usage date.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub use_date: String,
    pub supplier: String,
    pub item_name: String,
    pub spec: String,
    pub qty_resident: f64,
    pub qty_staff: f64,
}

/// Read the ledger's first worksheet and keep rows for one supplier.
///
/// Rows without a usage date are dropped; source order is preserved.
/// Quantity columns are facility-dependent and located by keyword match.
pub fn read_ledger(
    path: &Path,
    mode: FacilityMode,
    supplier: &str,
) -> Result<Vec<LedgerRow>, OrderFormError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| OrderFormError::WorkbookOpen {
            path: path.to_path_buf(),
            source: e,
        })?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .unwrap_or_else(|| "Sheet1".to_string());
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| OrderFormError::WorkbookRead {
            path: path.to_path_buf(),
            sheet,
            source: e,
        })?;

    ledger_rows_from_range(&range, mode, supplier)
}

pub(crate) fn ledger_rows_from_range(
    range: &Range<Data>,
    mode: FacilityMode,
    supplier: &str,
) -> Result<Vec<LedgerRow>, OrderFormError> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let idx_supplier = resolve_column(&headers, &[COL_SUPPLIER])?;
    let idx_use_date = resolve_column(&headers, &[COL_USE_DATE])?;
    let idx_food_name = resolve_column(&headers, &[COL_FOOD_NAME])?;
    let idx_spec = resolve_column(&headers, &[COL_SPEC])?;

    let (idx_resident, idx_staff) = match mode {
        FacilityMode::Tokuyou => (
            resolve_column(&headers, &["介護老人福祉施設いわと", "入所者"])?,
            Some(resolve_column(&headers, &["介護老人福祉施設いわと", "職員"])?),
        ),
        FacilityMode::Yuhouse => {
            // Exports label the care house either ケアハウス or ユーハウス;
            // the staff column is not used for this facility.
            let idx = resolve_column(&headers, &["ケアハウス", "入所者"])
                .or_else(|_| resolve_column(&headers, &["ユーハウス", "入所者"]))?;
            (idx, None)
        }
    };

    let mut ledger = Vec::new();
    for row in rows {
        let row_supplier = row.get(idx_supplier).map(cell_to_string).unwrap_or_default();
        if row_supplier != supplier {
            continue;
        }
        let use_date = row.get(idx_use_date).map(cell_to_string).unwrap_or_default();
        if use_date.trim().is_empty() {
            continue;
        }

        ledger.push(LedgerRow {
            use_date,
            supplier: row_supplier,
            item_name: row.get(idx_food_name).map(cell_to_string).unwrap_or_default(),
            spec: row.get(idx_spec).map(cell_to_string).unwrap_or_default(),
            qty_resident: row.get(idx_resident).map(cell_to_f64).unwrap_or(0.0),
            qty_staff: idx_staff
                .and_then(|idx| row.get(idx))
                .map(cell_to_f64)
                .unwrap_or(0.0),
        });
    }

    Ok(ledger)
}
