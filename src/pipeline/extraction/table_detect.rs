//! Layout-only table detection over extracted text.

use crate::models::document::{ExtractionWarning, PageExtraction, TableBlock};

/// Lines at each page boundary inspected for a continuing table.
const BOUNDARY_LINES: usize = 3;

/// Minimum ratio of tabular lines needed to consider a boundary as tabular.
const TABULAR_THRESHOLD: f64 = 0.60;

/// Fewer rows than this is a form line, not a table.
const MIN_TABLE_ROWS: usize = 2;

/// Split a line into cells on tabs, pipes or runs of 3+ spaces.
/// Empty cells (e.g. from leading/trailing pipes) are dropped.
pub fn split_columns(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0usize;

    let mut flush = |current: &mut String, cells: &mut Vec<String>| {
        let cell = current.trim();
        if !cell.is_empty() {
            cells.push(cell.to_string());
        }
        current.clear();
    };

    for ch in line.chars() {
        match ch {
            '\t' | '|' => {
                spaces = 0;
                flush(&mut current, &mut cells);
            }
            ' ' => {
                spaces += 1;
                if spaces == 3 {
                    flush(&mut current, &mut cells);
                } else if spaces < 3 {
                    current.push(ch);
                }
            }
            _ => {
                spaces = 0;
                current.push(ch);
            }
        }
    }
    flush(&mut current, &mut cells);
    cells
}

/// A line is tabular when it splits into at least two columns.
pub fn is_tabular_line(line: &str) -> bool {
    split_columns(line).len() >= 2
}

fn close_table(open: &mut Option<TableBlock>, tables: &mut Vec<TableBlock>) {
    if let Some(table) = open.take() {
        if table.rows.len() >= MIN_TABLE_ROWS {
            tables.push(table);
        }
    }
}

/// Group consecutive tabular lines into tables. Any non-tabular line
/// (blank or prose) closes the open table.
pub fn extract_tables(text: &str) -> Vec<TableBlock> {
    let mut tables = Vec::new();
    let mut open: Option<TableBlock> = None;

    for (index, line) in text.lines().enumerate() {
        let cells = split_columns(line);
        if cells.len() >= 2 {
            open.get_or_insert_with(|| TableBlock {
                start_line: index,
                rows: Vec::new(),
            })
            .rows
            .push(cells);
        } else {
            close_table(&mut open, &mut tables);
        }
    }
    close_table(&mut open, &mut tables);

    tables
}

/// Detect table continuation across page breaks and annotate pages.
///
/// Scans adjacent page pairs: if the last lines of page K and the first
/// lines of page K+1 both look tabular, adds a `TableContinuation`
/// warning to page K.
pub fn annotate_table_continuations(pages: &mut [PageExtraction]) {
    if pages.len() < 2 {
        return;
    }

    for i in 0..pages.len() - 1 {
        let tail_tabular = boundary_tabular(pages[i].text.lines().rev());
        let head_tabular = boundary_tabular(pages[i + 1].text.lines());

        if tail_tabular && head_tabular {
            let already = pages[i]
                .warnings
                .iter()
                .any(|w| matches!(w, ExtractionWarning::TableContinuation));
            if !already {
                pages[i].warnings.push(ExtractionWarning::TableContinuation);
            }
        }
    }
}

fn boundary_tabular<'a>(lines: impl Iterator<Item = &'a str>) -> bool {
    let lines: Vec<&str> = lines
        .filter(|l| !l.trim().is_empty())
        .take(BOUNDARY_LINES)
        .collect();
    if lines.is_empty() {
        return false;
    }
    let tabular = lines.iter().filter(|l| is_tabular_line(l)).count();
    tabular as f64 / lines.len() as f64 >= TABULAR_THRESHOLD
}
