// src/edgar/lookup.rs
use crate::edgar::client::Archive;
use crate::edgar::models::{CompanyTicker, RegistrantKey};
use crate::utils::error::EdgarError;
use std::collections::HashMap;
use std::path::Path;

pub const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Static ticker -> CIK table. Loaded once, then read-only.
#[derive(Debug, Default)]
pub struct TickerLookup {
    by_ticker: HashMap<String, RegistrantKey>,
}

/// Trims and upper-cases a user-supplied identifier.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_uppercase()
}

impl TickerLookup {
    /// Parses the SEC `company_tickers.json` shape. A malformed table is an error, not a
    /// partially loaded lookup.
    pub fn from_json(json: &str) -> Result<Self, EdgarError> {
        let records: HashMap<String, CompanyTicker> = serde_json::from_str(json)
            .map_err(|e| EdgarError::LookupTable(e.to_string()))?;

        let mut by_ticker = HashMap::with_capacity(records.len());
        for (idx, record) in records {
            let cik = record.cik_str.padded().ok_or_else(|| {
                EdgarError::LookupTable(format!("entry {} has a non-numeric CIK", idx))
            })?;
            let ticker = normalize_identifier(&record.ticker);
            by_ticker.insert(
                ticker.clone(),
                RegistrantKey { cik, ticker, company_name: record.title },
            );
        }

        tracing::debug!("Loaded {} tickers into lookup table", by_ticker.len());
        Ok(Self { by_ticker })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, EdgarError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EdgarError::LookupTable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Downloads the current table from the SEC.
    pub async fn fetch(archive: &dyn Archive) -> Result<Self, EdgarError> {
        tracing::info!("Downloading ticker lookup table from {}", COMPANY_TICKERS_URL);
        let json = archive.fetch_text(COMPANY_TICKERS_URL).await?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.by_ticker.len()
    }

    /// Resolves a ticker, ignoring case and surrounding whitespace.
    pub fn resolve(&self, identifier: &str) -> Result<RegistrantKey, EdgarError> {
        let ticker = normalize_identifier(identifier);
        self.by_ticker
            .get(&ticker)
            .cloned()
            .ok_or(EdgarError::NotFound(ticker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "0": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"},
        "1": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "2": {"cik_str": "1318605", "ticker": "tsla", "title": "Tesla, Inc."}
    }"#;

    #[test]
    fn test_resolution_ignores_case_and_whitespace() {
        let lookup = TickerLookup::from_json(TABLE).unwrap();
        let plain = lookup.resolve("MSFT").unwrap();
        let messy = lookup.resolve(" msft ").unwrap();
        assert_eq!(plain, messy);
        assert_eq!(plain.cik, "0000789019");
        assert_eq!(plain.company_name, "MICROSOFT CORP");
        assert_eq!(lookup.resolve("\tTsLa\n").unwrap().cik, "0001318605");
    }

    #[test]
    fn test_every_resolved_cik_has_fixed_width() {
        let lookup = TickerLookup::from_json(TABLE).unwrap();
        for ticker in ["msft", "aapl", "tsla"] {
            let key = lookup.resolve(ticker).unwrap();
            assert_eq!(key.cik.len(), 10);
            assert!(key.cik.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_unknown_identifier_is_not_found() {
        let lookup = TickerLookup::from_json(TABLE).unwrap();
        match lookup.resolve(" nope ") {
            Err(EdgarError::NotFound(t)) => assert_eq!(t, "NOPE"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_table_is_fatal() {
        assert!(matches!(TickerLookup::from_json("[1, 2]"), Err(EdgarError::LookupTable(_))));
        let bad_cik = r#"{"0": {"cik_str": "n/a", "ticker": "X", "title": "X"}}"#;
        assert!(matches!(TickerLookup::from_json(bad_cik), Err(EdgarError::LookupTable(_))));
    }
}
