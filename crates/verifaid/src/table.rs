//! Flat text rendering of tabular data for model prompts.

/// Placeholder emitted for a table with neither header nor rows.
pub const EMPTY_TABLE: &str = "(empty)";

const COLUMN_GAP: &str = "  ";

/// Render a header plus rows as right-aligned text columns, without an
/// index column. Ragged rows are padded with empty cells.
pub fn render(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return EMPTY_TABLE.to_string();
    }

    let mut widths = vec![0usize; columns];
    for line in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in line.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for (n, line) in std::iter::once(header)
        .chain(rows.iter().map(Vec::as_slice))
        .enumerate()
    {
        if n > 0 {
            out.push('\n');
        }
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                let cell = line.get(i).map(String::as_str).unwrap_or("");
                format!("{:>width$}", cell, width = widths[i])
            })
            .collect();
        out.push_str(cells.join(COLUMN_GAP).trim_end());
    }
    out
}
