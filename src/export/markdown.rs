//! Markdown helpers shared by the text exporters

/// Render a pipe table with left-aligned, padded columns.
///
/// ```text
/// | Field Name   | Type   |
/// |:-------------|:-------|
/// | country_id   | many2one -> res.country |
/// ```
pub fn pipe_table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell_text(cell.as_ref()).chars().count());
        }
    }

    let mut output = String::new();
    output.push_str(&render_row(headers.iter().copied(), &widths));
    output.push('\n');

    output.push('|');
    for width in &widths {
        output.push(':');
        output.push_str(&"-".repeat(width + 1));
        output.push('|');
    }

    for row in rows {
        output.push('\n');
        output.push_str(&render_row(row.iter().map(|c| c.as_ref()), &widths));
    }

    output
}

fn render_row<'a>(mut cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for width in widths {
        let text = cell_text(cells.next().unwrap_or(""));
        let pad = width - text.chars().count();
        line.push(' ');
        line.push_str(&text);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line
}

/// Cells are single-line and must not break the table
fn cell_text(cell: &str) -> String {
    cell.replace('\n', " ").replace('|', "\\|")
}

/// "Yes" / "No"
pub fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Fenced JSON block of a serializable value
pub fn json_block<T: serde::Serialize>(value: &T) -> String {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    format!("```json\n{}\n```\n", body)
}
