use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use rust_xlsxwriter::Workbook;
use tracing::{debug, info};

use crate::aggregate::aggregate_for_date;
use crate::cell::CellValue;
use crate::error::OrderFormError;
use crate::ledger::{read_ledger, FacilityMode, LedgerRow};
use crate::router::route_items;
use crate::sheets::{materialize_date_sheets, OrderSheet};
use crate::tags::load_tag_mapping;
use crate::template::load_template;

/// Run the full pipeline for one facility and write the workbook.
///
/// Loads the tag reference, the supplier-filtered ledger and the template
/// layout, then processes usage dates in ascending order: aggregate, route,
/// materialize. The scratch template sheet is never part of the output; only
/// generated per-date sheets are written.
pub fn generate_order_workbook(
    ledger_path: &Path,
    template_path: &Path,
    tag_path: &Path,
    supplier: &str,
    mode: FacilityMode,
    out_path: &Path,
) -> Result<PathBuf, OrderFormError> {
    info!(%mode, supplier, "generating order workbook");

    let tags = load_tag_mapping(tag_path)?;
    let ledger = read_ledger(ledger_path, mode, supplier)?;
    let layout = load_template(template_path)?;
    info!(
        ledger_rows = ledger.len(),
        tag_entries = tags.len(),
        fixed_slots = layout.fixed_slots.len(),
        "inputs loaded"
    );

    let mut existing_titles = HashSet::new();
    let mut sheets = Vec::new();
    for use_date in sorted_use_dates(&ledger) {
        let items = aggregate_for_date(&ledger, &use_date);
        let routed = route_items(&items, &tags, &layout.fixed_slots);
        debug!(
            %use_date,
            items = items.len(),
            slot_writes = routed.slot_writes.len(),
            appendix = routed.appendix.len(),
            "routed usage date"
        );
        sheets.extend(materialize_date_sheets(
            &layout,
            &use_date,
            &routed,
            &mut existing_titles,
        ));
    }

    write_workbook(&sheets, out_path)?;
    info!(sheets = sheets.len(), path = %out_path.display(), "workbook written");
    Ok(out_path.to_path_buf())
}

/// Write the 特養 and ユーハウス workbooks into one directory.
///
/// The two runs are independent: each loads fresh copies of all inputs and
/// writes to its own fixed-suffix file.
pub fn generate_order_forms_both_facilities(
    ledger_path: &Path,
    template_path: &Path,
    tag_path: &Path,
    supplier: &str,
    out_dir: &Path,
    prefix: &str,
) -> Result<(PathBuf, PathBuf), OrderFormError> {
    fs::create_dir_all(out_dir).map_err(|e| OrderFormError::CreateDir {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    let tokuyou_path = out_dir.join(format!(
        "{prefix}_{}.xlsm",
        FacilityMode::Tokuyou.output_suffix()
    ));
    let yuhouse_path = out_dir.join(format!(
        "{prefix}_{}.xlsm",
        FacilityMode::Yuhouse.output_suffix()
    ));

    generate_order_workbook(
        ledger_path,
        template_path,
        tag_path,
        supplier,
        FacilityMode::Tokuyou,
        &tokuyou_path,
    )?;
    generate_order_workbook(
        ledger_path,
        template_path,
        tag_path,
        supplier,
        FacilityMode::Yuhouse,
        &yuhouse_path,
    )?;

    Ok((tokuyou_path, yuhouse_path))
}

/// Distinct usage dates in ascending order.
///
/// Dates stay in their original display form ("3/23月"). Strings with a
/// leading M/D prefix sort by parsed month and day; anything else sorts
/// lexically after them.
pub(crate) fn sorted_use_dates(rows: &[LedgerRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dates: Vec<String> = rows
        .iter()
        .filter(|row| seen.insert(row.use_date.clone()))
        .map(|row| row.use_date.clone())
        .collect();
    dates.sort_by_key(|date| use_date_sort_key(date));
    dates
}

fn use_date_sort_key(date: &str) -> (u8, u32, u32, String) {
    static MMDD: OnceLock<Regex> = OnceLock::new();
    let mmdd = MMDD.get_or_init(|| Regex::new(r"^\s*(\d{1,2})/(\d{1,2})").unwrap());

    match mmdd.captures(date) {
        Some(caps) => {
            let month = caps[1].parse().unwrap_or(0);
            let day = caps[2].parse().unwrap_or(0);
            (0, month, day, date.to_string())
        }
        None => (1, 0, 0, date.to_string()),
    }
}

/// Write the materialized sheets to disk.
///
/// The workbook is saved to a sibling `.tmp` file and renamed into place, so
/// a failed run never leaves a half-written file at the destination.
fn write_workbook(sheets: &[OrderSheet], out_path: &Path) -> Result<(), OrderFormError> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| OrderFormError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let write_err = |e| OrderFormError::WorkbookWrite {
        path: out_path.to_path_buf(),
        source: e,
    };

    let mut workbook = Workbook::new();
    if sheets.is_empty() {
        // keep the file valid when the ledger has no usable dates
        workbook.add_worksheet();
    }
    for sheet in sheets {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&sheet.title)
            .map_err(write_err)?;
        for (&(row, col), value) in sheet.grid.iter() {
            match value {
                CellValue::Text(text) => worksheet.write_string(row - 1, col - 1, text),
                CellValue::Number(number) => worksheet.write_number(row - 1, col - 1, *number),
            }
            .map_err(write_err)?;
        }
    }

    let tmp_path = temp_path(out_path);
    workbook.save(&tmp_path).map_err(|e| OrderFormError::WorkbookWrite {
        path: tmp_path.clone(),
        source: e,
    })?;
    fs::rename(&tmp_path, out_path).map_err(|e| OrderFormError::Persist {
        from: tmp_path,
        to: out_path.to_path_buf(),
        source: e,
    })
}

fn temp_path(out_path: &Path) -> PathBuf {
    let mut name = out_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "workbook".into());
    name.push(".tmp");
    out_path.with_file_name(name)
}
