// src/edgar/crawler.rs
use crate::edgar::client::Archive;
use crate::edgar::models::{FilingReference, RegistrantKey};
use crate::utils::error::EdgarError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

pub const ANNUAL_REPORT_FORM: &str = "10-K";

const EDGAR_BROWSE_URL: &str = "https://www.sec.gov/cgi-bin/browse-edgar";
const EDGAR_HOST: &str = "https://www.sec.gov";
// Enough rows for a decade of annual reports plus amendments.
const LISTING_PAGE_SIZE: u32 = 40;

// --- CSS Selectors (Lazy Static) ---
static SERIES_CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div#seriesDiv").expect("Failed to compile SERIES_CONTAINER_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));

static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile CELL_SELECTOR"));

static DOCUMENTS_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a#documentsbutton").expect("Failed to compile DOCUMENTS_LINK_SELECTOR")
});

/// Browse-endpoint URL listing one registrant's filings of the given form type.
pub fn listing_url(cik: &str, form: &str) -> String {
    format!(
        "{}?action=getcompany&CIK={}&type={}&dateb=&owner=include&count={}",
        EDGAR_BROWSE_URL, cik, form, LISTING_PAGE_SIZE
    )
}

/// Fetches the filing listing for a registrant and returns its annual reports,
/// most recent first (the archive's own order).
pub async fn find_annual_filings(
    archive: &dyn Archive,
    registrant: &RegistrantKey,
) -> Result<Vec<FilingReference>, EdgarError> {
    let url = listing_url(&registrant.cik, ANNUAL_REPORT_FORM);
    tracing::info!("Fetching {} listing for {}", ANNUAL_REPORT_FORM, registrant);

    let html = archive.fetch_text(&url).await?;
    let filings = parse_filing_listing(&html, ANNUAL_REPORT_FORM, &registrant.cik)?;

    tracing::info!("Found {} {} filings", filings.len(), ANNUAL_REPORT_FORM);
    Ok(filings)
}

/// Extracts one [`FilingReference`] per listing row whose type cell is exactly `form`.
/// Amendments (`10-K/A`) and other forms are ignored; rows without a documents link are
/// skipped with a warning.
pub fn parse_filing_listing(
    html: &str,
    form: &str,
    cik: &str,
) -> Result<Vec<FilingReference>, EdgarError> {
    let no_filings = || EdgarError::NoFilingsFound { cik: cik.to_string(), form: form.to_string() };

    let document = Html::parse_document(html);
    let container = document.select(&SERIES_CONTAINER_SELECTOR).next().ok_or_else(|| {
        tracing::warn!("Listing page for CIK {} has no filing container", cik);
        no_filings()
    })?;

    let mut filings = Vec::new();
    for (index, row) in container.select(&ROW_SELECTOR).enumerate() {
        let cells: Vec<_> = row.select(&CELL_SELECTOR).collect();
        let Some(type_cell) = cells.first() else { continue }; // header row
        let row_form = type_cell.text().collect::<String>();
        if row_form.trim() != form {
            continue;
        }

        let Some(href) = row
            .select(&DOCUMENTS_LINK_SELECTOR)
            .next()
            .and_then(|link| link.value().attr("href"))
        else {
            tracing::warn!("Skipping {} row {} without a documents link", form, index);
            continue;
        };

        let mut filing = FilingReference::new(absolute_url(href), form);
        filing.filing_date = cells
            .iter()
            .map(|c| c.text().collect::<String>())
            .find(|text| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok())
            .map(|text| text.trim().to_string());
        filings.push(filing);
    }

    if filings.is_empty() {
        return Err(no_filings());
    }
    Ok(filings)
}

fn absolute_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}/{}", EDGAR_HOST, href.trim_start_matches('/'))
    }
}
