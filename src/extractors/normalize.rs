// src/extractors/normalize.rs
use crate::dataset::{CellValue, NormalizedFilingTable, NormalizedRow};
use crate::extractors::table::RawTableRecord;
use crate::utils::error::ExtractError;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Period headers look like `Dec. 31, 2022`.
pub const PERIOD_DATE_FORMAT: &str = "%b. %d, %Y";
// Months short enough to need no abbreviation are printed without the period ("May 31, 2023").
const PERIOD_DATE_FORMAT_UNABBREVIATED: &str = "%b %d, %Y";

// --- Regex Patterns (Lazy Static) ---
// Currency sign, thousands separator and the closing half of accounting negatives.
static CURRENCY_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$,)]").expect("Failed to compile CURRENCY_NOISE_RE"));

static INNER_WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile INNER_WHITESPACE_RE"));

/// `"$ (1,234)"` -> `"-1234"`. Idempotent.
pub fn clean_currency(raw: &str) -> String {
    CURRENCY_NOISE_RE.replace_all(raw, "").replace('(', "-").trim().to_string()
}

/// Coerces a cleaned cell. Blank cells are [`CellValue::Empty`]; anything that is not a
/// number is reported as [`ExtractError::NumericCoercion`].
pub fn coerce_numeric(cleaned: &str) -> Result<CellValue, ExtractError> {
    let compact = INNER_WHITESPACE_RE.replace_all(cleaned, "");
    if compact.is_empty() {
        return Ok(CellValue::Empty);
    }
    compact
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(CellValue::Number)
        .ok_or_else(|| ExtractError::NumericCoercion(cleaned.to_string()))
}

/// Parses one period header label.
pub fn parse_period(label: &str) -> Result<NaiveDate, ExtractError> {
    let label = label.trim();
    NaiveDate::parse_from_str(label, PERIOD_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(label, PERIOD_DATE_FORMAT_UNABBREVIATED))
        .map_err(|e| ExtractError::DateParse { value: label.to_string(), reason: e.to_string() })
}

/// Flattens one filing's statement records into a single `category -> value` table.
///
/// The second header row of the first record carries the period dates (the first one is the
/// "12 Months Ended" group label). Every date in it must parse; the first one names the
/// value column. Data rows of all records are concatenated and reduced to their first two
/// cells. Rows with a blank category are dropped; values that don't coerce stay as text.
pub fn normalize_filing(records: &[RawTableRecord]) -> Result<NormalizedFilingTable, ExtractError> {
    let first = records
        .first()
        .ok_or_else(|| ExtractError::MissingPeriodHeader("no statement records".to_string()))?;
    let header = first
        .headers
        .get(1)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            ExtractError::MissingPeriodHeader(format!(
                "{} has {} header rows, expected at least 2",
                first.document,
                first.headers.len()
            ))
        })?;

    let periods = header.iter().map(|label| parse_period(label)).collect::<Result<Vec<_>, _>>()?;
    let period = periods[0];
    let value_column = header[0].clone();
    let category_column = format!("Category {}", period.year());

    let mut rows = Vec::new();
    for (document, data_row) in records
        .iter()
        .flat_map(|r| r.data.iter().map(move |row| (r.document.as_str(), row)))
    {
        let category = data_row.first().map(|c| c.trim()).unwrap_or_default();
        if category.is_empty() {
            continue;
        }

        // Only the value is cleaned; labels like "Other income (expense), net" keep their text.
        let value = match data_row.get(1) {
            None => CellValue::Empty,
            Some(raw) => {
                let cleaned = clean_currency(raw);
                coerce_numeric(&cleaned).unwrap_or_else(|e| {
                    tracing::debug!("{}: keeping '{}' as text ({})", document, category, e);
                    CellValue::Text(cleaned)
                })
            }
        };
        rows.push(NormalizedRow { category: category.to_string(), value });
    }

    tracing::debug!("Normalized {} rows for period {}", rows.len(), period);
    Ok(NormalizedFilingTable { period, category_column, value_column, rows })
}
