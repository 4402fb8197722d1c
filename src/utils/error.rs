// src/utils/error.rs
use thiserror::Error;

// Errors raised while talking to the archive or resolving what to fetch from it
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500 Internal Server Error

    #[error("SEC rate limit likely exceeded or User-Agent rejected")]
    RateLimited,

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("No company found for identifier '{0}'")]
    NotFound(String),

    #[error("No {form} filings found for CIK {cik}")]
    NoFilingsFound { cik: String, form: String },

    #[error("Invalid ticker lookup table: {0}")]
    LookupTable(String),
}

impl EdgarError {
    /// Whether a retry of the same request has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            EdgarError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EdgarError::Http(status) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

// Errors scoped to a single filing, statement document, row or cell
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Filing manifest could not be parsed: {0}")]
    ManifestParse(String),

    #[error("No table found in statement document {0}")]
    TableNotFound(String),

    #[error("Row {index} could not be classified: {reason}")]
    RowClassification { index: usize, reason: String },

    #[error("Period header '{value}' is not a date: {reason}")]
    DateParse { value: String, reason: String },

    #[error("Missing period header: {0}")]
    MissingPeriodHeader(String),

    #[error("Value '{0}' is not numeric")]
    NumericCoercion(String),

    #[error("No statement data could be scraped for filing {0}")]
    EmptyFiling(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<csv::Error> for StorageError {
    fn from(e: csv::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

// A filing-level failure: either the archive or the extraction gave up on it
#[derive(Error, Debug)]
pub enum FilingError {
    #[error(transparent)]
    Edgar(#[from] EdgarError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}

impl AppError {
    /// A short suggestion printed under the error message at the CLI boundary.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::Edgar(EdgarError::NotFound(_)) => {
                Some("check the ticker symbol, or pass --lookup with a newer company_tickers.json")
            }
            AppError::Edgar(EdgarError::NoFilingsFound { .. }) => {
                Some("the company may not file 10-K reports (foreign issuers file 20-F)")
            }
            AppError::Edgar(EdgarError::RateLimited) => {
                Some("set --user-agent (or EDGAR_USER_AGENT) to 'Name contact@example.com'")
            }
            AppError::Processing(_) => Some("rerun with RUST_LOG=debug to see per-filing diagnostics"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(EdgarError::Http(reqwest::StatusCode::BAD_GATEWAY).is_transient());
        assert!(EdgarError::Http(reqwest::StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(!EdgarError::Http(reqwest::StatusCode::NOT_FOUND).is_transient());
        assert!(!EdgarError::RateLimited.is_transient());
        assert!(!EdgarError::NotFound("XYZ".into()).is_transient());
    }

    #[test]
    fn test_hints_for_run_level_errors() {
        let err = AppError::from(EdgarError::NotFound("ZZZZ".into()));
        assert!(err.hint().is_some());
        assert_eq!(err.to_string(), "EDGAR interaction failed: No company found for identifier 'ZZZZ'");
        assert!(AppError::Config("x".into()).hint().is_none());
    }
}
