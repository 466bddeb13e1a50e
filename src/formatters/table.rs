use crate::types::{ReportResult, ReportRow};

const HEADERS: [&str; 3] = ["Label", "Active", "Count"];

/// Renders the report as a titled Markdown table.
///
/// The title quotes the range exactly as the user typed it. Columns are padded
/// to the widest cell, labels left-aligned and counts right-aligned; rows keep
/// their input order.
pub fn format(result: &ReportResult, from_input: &str, to_input: &str) -> String {
    let cells: Vec<[String; 3]> = result.rows.iter().map(row_cells).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 4);
    lines.push(format!(
        "Deployment-Status between `{from_input}` and `{to_input}`"
    ));
    lines.push(String::new());
    lines.push(format!(
        "| {:<w0$} | {:<w1$} | {:<w2$} |",
        HEADERS[0],
        HEADERS[1],
        HEADERS[2],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2]
    ));
    // label column left, counts right
    lines.push(format!(
        "|{}|{}:|{}:|",
        "-".repeat(widths[0] + 2),
        "-".repeat(widths[1] + 1),
        "-".repeat(widths[2] + 1)
    ));
    for [label, active, count] in &cells {
        lines.push(format!(
            "| {:<w0$} | {:>w1$} | {:>w2$} |",
            label,
            active,
            count,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        ));
    }

    lines.join("\n")
}

fn row_cells(row: &ReportRow) -> [String; 3] {
    [
        row.label.replace('|', "\\|"),
        row.active.to_string(),
        row.count.to_string(),
    ]
}
