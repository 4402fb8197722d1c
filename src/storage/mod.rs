// src/storage/mod.rs
use crate::pipeline::RunReport;
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Directory for one company: /base_dir/TICKER/
    pub fn company_dir(&self, ticker: &str) -> PathBuf {
        self.base_dir.join(ticker.to_uppercase())
    }

    fn ensure_company_dir(&self, ticker: &str) -> Result<PathBuf, StorageError> {
        let target_dir = self.company_dir(ticker);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    /// Writes the dataset as CSV, one header line followed by one line per row.
    pub fn save_dataset(&self, report: &RunReport) -> Result<PathBuf, StorageError> {
        let ticker = &report.registrant.ticker;
        let file_path = self
            .ensure_company_dir(ticker)?
            .join(format!("{}_statements.csv", ticker.to_uppercase()));

        let mut writer = csv::Writer::from_path(&file_path)?;
        writer.write_record(report.dataset.headers())?;
        for row in report.dataset.rows() {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved dataset to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the run in JSON format
    pub fn save_metadata(&self, report: &RunReport) -> Result<PathBuf, StorageError> {
        let ticker = &report.registrant.ticker;
        let file_path = self
            .ensure_company_dir(ticker)?
            .join(format!("{}_statements_meta.json", ticker.to_uppercase()));

        let skipped: Vec<_> = report
            .skipped
            .iter()
            .map(|s| {
                serde_json::json!({
                    "index_url": s.filing.index_url,
                    "form_type": s.filing.form_type,
                    "filing_date": s.filing.filing_date,
                    "reason": s.reason,
                })
            })
            .collect();

        let metadata = serde_json::json!({
            "ticker": report.registrant.ticker,
            "cik": report.registrant.cik,
            "company_name": report.registrant.company_name,
            "periods": report.periods.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            "columns": report.dataset.headers(),
            "value_columns": report
                .dataset
                .value_columns()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>(),
            "row_count": report.dataset.row_count(),
            "skipped_filings": skipped,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CellValue, Column, ColumnRole, MasterDataset};
    use crate::edgar::models::{FilingReference, RegistrantKey};
    use crate::pipeline::SkippedFiling;
    use chrono::NaiveDate;

    fn report() -> RunReport {
        RunReport {
            registrant: RegistrantKey {
                cik: "0000789019".into(),
                ticker: "msft".into(),
                company_name: "MICROSOFT CORP".into(),
            },
            dataset: MasterDataset {
                columns: vec![
                    Column::new("Category 2023", ColumnRole::Category, vec![CellValue::Text("Revenue, net".into())]),
                    Column::new("Jun. 30, 2023", ColumnRole::Value, vec![CellValue::Number(211915.0)]),
                ],
            },
            periods: vec![NaiveDate::from_ymd_opt(2023, 6, 30).unwrap()],
            skipped: vec![SkippedFiling {
                filing: FilingReference::new("https://www.sec.gov/Archives/x/y-index.htm", "10-K"),
                reason: "Period header 'FY' is not a date".into(),
            }],
        }
    }

    #[test]
    fn test_save_dataset_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("out")).unwrap();
        let path = storage.save_dataset(&report()).unwrap();

        assert!(path.ends_with("MSFT/MSFT_statements.csv"));
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "Category 2023,\"Jun. 30, 2023\"\n\"Revenue, net\",211915\n");
    }

    #[test]
    fn test_save_metadata_lists_skipped_filings() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let path = storage.save_metadata(&report()).unwrap();

        let meta: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(meta["cik"], "0000789019");
        assert_eq!(meta["periods"][0], "2023-06-30");
        assert_eq!(meta["row_count"], 1);
        assert_eq!(meta["value_columns"], serde_json::json!(["Jun. 30, 2023"]));
        assert_eq!(meta["skipped_filings"][0]["form_type"], "10-K");
        assert_eq!(meta["skipped_filings"][0]["reason"], "Period header 'FY' is not a date");
    }
}
