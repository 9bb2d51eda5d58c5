use calamine::Data;

/// A cell value carried from the template into the output workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

/// Convert a calamine cell into a `CellValue`, dropping empty cells.
pub fn cell_value_from(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string())),
        other => Some(CellValue::Text(other.to_string())),
    }
}

/// Render a cell as the string the pipeline compares and stores.
///
/// Integral floats print without a trailing `.0` so numeric product codes
/// round-trip as `1001`, not `1001.0`.
pub fn cell_to_string(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        other => other.to_string(),
    }
}

/// Coerce a quantity cell to a number; invalid or missing values become 0.
pub fn cell_to_f64(data: &Data) -> f64 {
    match data {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s.trim().parse().unwrap_or(0.0),
        Data::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}
