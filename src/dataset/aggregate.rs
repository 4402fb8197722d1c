// src/dataset/aggregate.rs
use crate::dataset::{CellValue, Column, ColumnRole, MasterDataset, NormalizedFilingTable};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

/// How per-filing tables are lined up in the [`MasterDataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Column-wise concatenation: each filing keeps its own category column and rows line up
    /// by position only.
    #[default]
    Position,
    /// One shared category column; each filing's values are joined on the category label.
    Category,
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "position" | "positional" => Ok(Alignment::Position),
            "category" | "join" => Ok(Alignment::Category),
            other => Err(format!("unknown alignment '{}', expected 'position' or 'category'", other)),
        }
    }
}

/// Builds the multi-year dataset from per-filing tables given most-recent-first.
pub fn aggregate(tables: &[NormalizedFilingTable], alignment: Alignment) -> MasterDataset {
    match alignment {
        Alignment::Position => concat_columns(tables),
        Alignment::Category => join_on_category(tables),
    }
}

fn concat_columns(tables: &[NormalizedFilingTable]) -> MasterDataset {
    let mut dataset = MasterDataset::default();
    for table in tables {
        let categories = table.rows.iter().map(|r| CellValue::Text(r.category.clone())).collect();
        let values = table.rows.iter().map(|r| r.value.clone()).collect();
        dataset.columns.push(Column::new(&table.category_column, ColumnRole::Category, categories));
        dataset.columns.push(Column::new(&table.value_column, ColumnRole::Value, values));
    }
    dataset
}

/// Label used for joining: trimmed, inner whitespace collapsed, upper-cased.
pub fn category_key(label: &str) -> String {
    WHITESPACE_RE.replace_all(label.trim(), " ").to_uppercase()
}

// Repeated labels ("Total", "Other") are matched by occurrence: the second "Total" of one
// year lines up with the second "Total" of another.
fn join_on_category(tables: &[NormalizedFilingTable]) -> MasterDataset {
    let mut labels: Vec<String> = Vec::new();
    let mut row_of: HashMap<(String, usize), usize> = HashMap::new();
    let mut per_table: Vec<HashMap<usize, CellValue>> = Vec::with_capacity(tables.len());

    for table in tables {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut cells = HashMap::new();
        for row in &table.rows {
            let key = category_key(&row.category);
            let occurrence = seen.entry(key.clone()).or_insert(0);
            let slot = *row_of.entry((key, *occurrence)).or_insert_with(|| {
                labels.push(row.category.clone());
                labels.len() - 1
            });
            *occurrence += 1;
            cells.insert(slot, row.value.clone());
        }
        per_table.push(cells);
    }

    let mut dataset = MasterDataset::default();
    if tables.is_empty() {
        return dataset;
    }
    dataset.columns.push(Column::new(
        "Category",
        ColumnRole::Category,
        labels.into_iter().map(CellValue::Text).collect(),
    ));
    let row_count = dataset.row_count();
    for (table, mut cells) in tables.iter().zip(per_table) {
        let values = (0..row_count).map(|i| cells.remove(&i).unwrap_or(CellValue::Empty)).collect();
        dataset.columns.push(Column::new(&table.value_column, ColumnRole::Value, values));
    }
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::NormalizedRow;
    use chrono::NaiveDate;

    fn table(year: i32, rows: &[(&str, CellValue)]) -> NormalizedFilingTable {
        NormalizedFilingTable {
            period: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            category_column: format!("Category {}", year),
            value_column: format!("Dec. 31, {}", year),
            rows: rows
                .iter()
                .map(|(c, v)| NormalizedRow { category: c.to_string(), value: v.clone() })
                .collect(),
        }
    }

    #[test]
    fn test_two_year_concat_has_two_value_columns() {
        let tables = vec![
            table(2022, &[("Revenue", CellValue::Number(1234.0))]),
            table(2021, &[("Revenue", CellValue::Number(1234.0))]),
        ];
        let ds = aggregate(&tables, Alignment::Position);
        assert_eq!(ds.value_columns().count(), 2);
        assert_eq!(
            ds.headers(),
            vec!["Category 2022", "Dec. 31, 2022", "Category 2021", "Dec. 31, 2021"]
        );
        for value in ds.values_for("Revenue") {
            assert_eq!(value, Some(&CellValue::Number(1234.0)));
        }
    }

    #[test]
    fn test_positional_concat_does_not_realign() {
        let tables = vec![
            table(2022, &[("Revenue", CellValue::Number(5.0)), ("Cost", CellValue::Number(3.0))]),
            table(2021, &[("Cost", CellValue::Number(2.0))]),
        ];
        let ds = aggregate(&tables, Alignment::Position);
        let rows = ds.rows();
        // Row 0 pairs 2022 Revenue with 2021 Cost: position, not label
        assert_eq!(rows[0][0], &CellValue::Text("Revenue".into()));
        assert_eq!(rows[0][2], &CellValue::Text("Cost".into()));
        assert_eq!(rows[1][2], &CellValue::Empty);
    }

    #[test]
    fn test_category_join_aligns_labels() {
        let tables = vec![
            table(2022, &[
                ("Revenue", CellValue::Number(5.0)),
                ("Total", CellValue::Number(1.0)),
                ("Cost", CellValue::Number(3.0)),
                ("Total", CellValue::Number(2.0)),
            ]),
            table(2021, &[
                ("Cost", CellValue::Number(2.0)),
                ("revenue ", CellValue::Number(4.0)),
                ("Total", CellValue::Number(10.0)),
                ("Impairment", CellValue::Number(7.0)),
            ]),
        ];
        let ds = aggregate(&tables, Alignment::Category);
        assert_eq!(ds.headers(), vec!["Category", "Dec. 31, 2022", "Dec. 31, 2021"]);
        assert_eq!(ds.row_count(), 5);

        let rows = ds.rows();
        let labels: Vec<String> = rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(labels, vec!["Revenue", "Total", "Cost", "Total", "Impairment"]);
        assert_eq!(rows[0][2], &CellValue::Number(4.0));
        assert_eq!(rows[1][2], &CellValue::Number(10.0));
        assert_eq!(rows[3][2], &CellValue::Empty);
        assert_eq!(rows[4][1], &CellValue::Empty);
        assert_eq!(rows[4][2], &CellValue::Number(7.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], Alignment::Position).is_empty());
        assert!(aggregate(&[], Alignment::Category).is_empty());
    }

    #[test]
    fn test_alignment_from_str() {
        assert_eq!("Category".parse::<Alignment>(), Ok(Alignment::Category));
        assert_eq!("position".parse::<Alignment>(), Ok(Alignment::Position));
        assert!("rows".parse::<Alignment>().is_err());
    }
}
