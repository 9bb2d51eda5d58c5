use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the order-form pipeline.
///
/// Every variant carries enough context to diagnose the problem without
/// re-running: missing columns report the attempted keywords and the full
/// header list, file errors report the offending path. There is no retry
/// logic anywhere; any error aborts the whole run.
#[derive(Debug, Error)]
pub enum OrderFormError {
    #[error(
        "no column matching keywords {keywords:?}; available columns: {}",
        available.join(", ")
    )]
    ColumnNotFound {
        keywords: Vec<String>,
        available: Vec<String>,
    },

    #[error(
        "reference sheet '{sheet}' not found in {}; available sheets: {}",
        path.display(),
        available.join(", ")
    )]
    ReferenceSheetMissing {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error(
        "template sheet '{sheet}' not found in {}; available sheets: {}",
        path.display(),
        available.join(", ")
    )]
    TemplateSheetMissing {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("facility mode must be 'tokuyou' or 'yuhouse', got '{0}'")]
    InvalidFacilityMode(String),

    #[error("failed to open workbook {}", path.display())]
    WorkbookOpen {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("failed to read sheet '{sheet}' from {}", path.display())]
    WorkbookRead {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("failed to write workbook {}", path.display())]
    WorkbookWrite {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {} into place at {}", from.display(), to.display())]
    Persist {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
