// src/utils/html_debug.rs
use crate::extractors::table::{classify_rows, ClassifiedRow, RowKind};
use crate::utils::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn row_cells(row: &ClassifiedRow) -> Vec<String> {
    match row {
        ClassifiedRow::Header(cells) | ClassifiedRow::Data(cells) => cells.clone(),
        ClassifiedRow::SectionLabel(label) => vec![label.clone()],
    }
}

/// Renders how every row of a statement document was classified, one highlighted line per
/// row, so a misread table can be inspected in a browser.
pub fn annotate_rows(html: &str, document: &str) -> Result<String, AppError> {
    let rows = classify_rows(html, document)?;

    // Add debug styling in head
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<style>\n");
    debug_html.push_str(".row-header { background-color: #ADD8E6; }\n");
    debug_html.push_str(".row-section { background-color: #FFFF00; }\n");
    debug_html.push_str(".row-data { background-color: #90EE90; }\n");
    debug_html.push_str(".row-error { background-color: #FFC0CB; }\n");
    debug_html.push_str("td { padding: 2px 8px; border-bottom: 1px solid #ddd; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");
    debug_html.push_str(&format!("<h1>{}</h1>\n<table>\n", escape(document)));

    for (index, row) in rows.iter().enumerate() {
        let (css_class, kind, cells) = match row {
            Ok(row) => {
                let (css_class, kind) = match row.kind() {
                    RowKind::Header => ("row-header", "header"),
                    RowKind::SectionLabel => ("row-section", "section"),
                    RowKind::Data => ("row-data", "data"),
                };
                (css_class, kind, row_cells(row))
            }
            Err(e) => ("row-error", "error", vec![e.to_string()]),
        };
        debug_html.push_str(&format!(
            "<tr class=\"{}\" title=\"Row {}\"><td>{}</td><td>{}</td>",
            css_class, index, index, kind
        ));
        for cell in cells {
            debug_html.push_str(&format!("<td>{}</td>", escape(&cell)));
        }
        debug_html.push_str("</tr>\n");
    }

    debug_html.push_str("</table>\n</body>\n</html>");
    Ok(debug_html)
}

/// Saves the raw statement document and its annotated rendering under `dir`.
/// Returns the path of the annotated file.
pub fn save_statement_debug(dir: &Path, document: &str, html: &str) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)?;

    let raw_path = dir.join(document);
    fs::write(&raw_path, html)?;

    let annotated_path = dir.join(format!("{}.annotated.html", document));
    fs::write(&annotated_path, annotate_rows(html, document)?)?;

    tracing::debug!("Saved debug HTML to {}", annotated_path.display());
    Ok(annotated_path)
}
