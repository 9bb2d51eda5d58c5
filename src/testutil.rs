use calamine::{Data, Range};

/// Build an in-memory worksheet range from row-major cells, anchored at A1.
pub fn range_from_rows(rows: Vec<Vec<Data>>) -> Range<Data> {
    let height = rows.len() as u32;
    let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
    assert!(height > 0 && width > 0, "range must have at least one cell");

    let mut range = Range::new((0, 0), (height - 1, width - 1));
    for (r, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            if value != Data::Empty {
                range.set_value((r as u32, c as u32), value);
            }
        }
    }
    range
}

pub fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

pub fn num(value: f64) -> Data {
    Data::Float(value)
}
