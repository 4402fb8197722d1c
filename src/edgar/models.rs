// src/edgar/models.rs
use serde::Deserialize;
use std::fmt;

/// Width of the zero-padded CIK used in EDGAR URLs and listings.
pub const CIK_WIDTH: usize = 10;

/// One record of the SEC ticker lookup table.
/// Example: https://www.sec.gov/files/company_tickers.json
/// `{"0": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"}, ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTicker {
    pub cik_str: CikValue,
    pub ticker: String,
    pub title: String,
}

/// The published table carries the CIK as a number, hand-maintained copies often as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CikValue {
    Number(u64),
    Text(String),
}

impl CikValue {
    /// Formats the CIK zero-padded to [`CIK_WIDTH`]. Returns `None` if it is not numeric.
    pub fn padded(&self) -> Option<String> {
        match self {
            CikValue::Number(n) => Some(format!("{:0width$}", n, width = CIK_WIDTH)),
            CikValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                Some(format!("{:0>width$}", s, width = CIK_WIDTH))
            }
        }
    }
}

/// A company resolved from its ticker. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrantKey {
    pub cik: String,
    pub ticker: String,
    pub company_name: String,
}

impl fmt::Display for RegistrantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (CIK {}, {})", self.ticker, self.cik, self.company_name)
    }
}

/// A discovered annual report, identified by its filing index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingReference {
    pub index_url: String,
    pub form_type: String,
    pub filing_date: Option<String>,
}

impl FilingReference {
    pub fn new(index_url: impl Into<String>, form_type: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
            form_type: form_type.into(),
            filing_date: None,
        }
    }

    /// Content directory of this filing: the index URL without its final path segment.
    /// `.../000095017023035122/0000950170-23-035122-index.htm` -> `.../000095017023035122`
    pub fn base(&self) -> FilingBase {
        let dir = match self.index_url.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => self.index_url.as_str(),
        };
        FilingBase(dir.to_string())
    }
}

/// Directory URL holding every document of one filing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingBase(pub String);

impl FilingBase {
    /// URL of a document inside this filing directory.
    pub fn document_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.0, file_name.trim_start_matches('/'))
    }

    pub fn manifest_url(&self) -> String {
        self.document_url("FilingSummary.xml")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilingBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_strips_last_segment() {
        let filing = FilingReference::new(
            "https://www.sec.gov/Archives/edgar/data/789019/000095017023035122/0000950170-23-035122-index.htm",
            "10-K",
        );
        let base = filing.base();
        assert_eq!(base.as_str(), "https://www.sec.gov/Archives/edgar/data/789019/000095017023035122");
        assert_eq!(
            base.manifest_url(),
            "https://www.sec.gov/Archives/edgar/data/789019/000095017023035122/FilingSummary.xml"
        );
        assert_eq!(
            base.document_url("R2.htm"),
            "https://www.sec.gov/Archives/edgar/data/789019/000095017023035122/R2.htm"
        );
    }

    #[test]
    fn test_base_without_path_is_total() {
        assert_eq!(FilingReference::new("index.htm", "10-K").base().as_str(), "index.htm");
        assert_eq!(
            FilingReference::new("https://x.test/a/b/", "10-K").base().as_str(),
            "https://x.test/a/b"
        );
    }

    #[test]
    fn test_cik_padding() {
        assert_eq!(CikValue::Number(789019).padded().as_deref(), Some("0000789019"));
        assert_eq!(CikValue::Text(" 320193 ".into()).padded().as_deref(), Some("0000320193"));
        assert_eq!(CikValue::Text("12ab".into()).padded(), None);
    }
}
