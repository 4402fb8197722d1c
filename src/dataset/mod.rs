// src/dataset/mod.rs
pub mod aggregate;

use chrono::NaiveDate;
use std::fmt;

pub use aggregate::{aggregate, Alignment};

// Widest a rendered column gets before its text is cut.
const MAX_RENDER_WIDTH: usize = 60;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// A single cell after numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

#[cfg(test)]
impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub category: String,
    pub value: CellValue,
}

/// One filing's statements flattened to `category -> value` for its latest period.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFilingTable {
    pub period: NaiveDate,
    /// `Category <year>`
    pub category_column: String,
    /// The period header label as printed in the filing, e.g. `Dec. 31, 2022`.
    pub value_column: String,
    pub rows: Vec<NormalizedRow>,
}

#[cfg(test)]
impl NormalizedFilingTable {
    /// First value recorded for `category`.
    pub fn value_of(&self, category: &str) -> Option<&CellValue> {
        self.rows.iter().find(|r| r.category == category).map(|r| &r.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Category,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub role: ColumnRole,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, role: ColumnRole, cells: Vec<CellValue>) -> Self {
        Self { name: name.into(), role, cells }
    }

    fn cell(&self, row: usize) -> &CellValue {
        self.cells.get(row).unwrap_or(&EMPTY_CELL)
    }
}

/// The multi-year result: named columns of cells. Columns may differ in length; missing
/// cells read as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterDataset {
    pub columns: Vec<Column>,
}

impl MasterDataset {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn value_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.role == ColumnRole::Value)
    }

    /// Row-major view, padded to [`row_count`](Self::row_count).
    pub fn rows(&self) -> Vec<Vec<&CellValue>> {
        (0..self.row_count())
            .map(|row| self.columns.iter().map(|c| c.cell(row)).collect())
            .collect()
    }

    #[cfg(test)]
    /// The value of `category` in every value column, read against the closest category
    /// column to its left. `None` where that year has no such category.
    pub fn values_for(&self, category: &str) -> Vec<Option<&CellValue>> {
        let mut result = Vec::new();
        let mut labels: Option<&Column> = None;
        for column in &self.columns {
            match column.role {
                ColumnRole::Category => labels = Some(column),
                ColumnRole::Value => {
                    let row = labels.and_then(|l| {
                        l.cells.iter().position(|c| c.as_text() == Some(category))
                    });
                    result.push(row.map(|r| column.cell(r)));
                }
            }
        }
        result
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

impl fmt::Display for MasterDataset {
    /// Fixed-width text table, category columns left-aligned and value columns right-aligned.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "(empty dataset)");
        }

        let rendered: Vec<Vec<String>> = self
            .rows()
            .into_iter()
            .map(|row| row.into_iter().map(|c| truncate(&c.to_string(), MAX_RENDER_WIDTH)).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                rendered
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.name.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(MAX_RENDER_WIDTH)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", truncate(&c.name, *w), w = *w))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in rendered {
            let line: Vec<String> = row
                .iter()
                .zip(self.columns.iter().zip(&widths))
                .map(|(text, (column, w))| match column.role {
                    ColumnRole::Category => format!("{:<w$}", text, w = *w),
                    ColumnRole::Value => format!("{:>w$}", text, w = *w),
                })
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())?;
        }
        Ok(())
    }
}
