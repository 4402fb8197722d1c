// src/extractors/manifest.rs
use crate::edgar::client::Archive;
use crate::edgar::models::FilingBase;
use crate::utils::error::{ExtractError, FilingError};
use roxmltree::{Document, Node, ParsingOptions};

/// One report listed in a filing's `FilingSummary.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementEntry {
    /// Upper-cased `ShortName`, e.g. "CONSOLIDATED BALANCE SHEETS".
    pub name: String,
    /// Document inside the filing directory, e.g. "R4.htm".
    pub file_name: String,
    /// `MenuCategory` ("Statements", "Notes", ...) when the manifest provides it.
    pub category: Option<String>,
}

/// Statement name -> document file for one filing, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementMap {
    entries: Vec<StatementEntry>,
}

impl StatementMap {
    /// Adds an entry; a repeated name keeps its first position and takes the newer file.
    pub fn insert(&mut self, entry: StatementEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Exact lookup by (case-insensitive) statement name.
    pub fn get(&self, name: &str) -> Option<&StatementEntry> {
        let name = name.trim().to_uppercase();
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatementEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches and parses `<base>/FilingSummary.xml`.
pub async fn fetch_statement_map(
    archive: &dyn Archive,
    base: &FilingBase,
) -> Result<StatementMap, FilingError> {
    let xml = archive.fetch_text(&base.manifest_url()).await?;
    let map = parse_manifest(&xml)?;
    tracing::debug!("Manifest for {} lists {} statements", base, map.len());
    Ok(map)
}

/// Builds a [`StatementMap`] from manifest XML.
///
/// The last `Report` under `MyReports` is the manifest's "All Reports" entry and is not a
/// statement, so it is always dropped. Reports without a document file are skipped.
pub fn parse_manifest(xml: &str) -> Result<StatementMap, ExtractError> {
    let options = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| ExtractError::ManifestParse(e.to_string()))?;

    let reports_container = doc
        .descendants()
        .find(|n| is_element_named(n, "MyReports"))
        .ok_or_else(|| ExtractError::ManifestParse("no MyReports element".to_string()))?;

    let reports: Vec<Node> = reports_container
        .children()
        .filter(|n| is_element_named(n, "Report"))
        .collect();

    let mut map = StatementMap::default();
    let statement_count = reports.len().saturating_sub(1);
    for report in reports.into_iter().take(statement_count) {
        let Some(name) = child_text(report, "ShortName") else {
            tracing::warn!("Skipping manifest report without ShortName");
            continue;
        };
        // Older filings only carry the XML rendering of a report
        let Some(file_name) =
            child_text(report, "HtmlFileName").or_else(|| child_text(report, "XmlFileName"))
        else {
            tracing::warn!("Skipping manifest report '{}' without a document file", name);
            continue;
        };

        map.insert(StatementEntry {
            name: name.to_uppercase(),
            file_name,
            category: child_text(report, "MenuCategory"),
        });
    }

    Ok(map)
}

fn is_element_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name().eq_ignore_ascii_case(name)
}

fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| is_element_named(n, name))
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::client::testing::MemoryArchive;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FilingSummary>
  <Version>3.23.2</Version>
  <MyReports>
    <Report instance="msft-20230630.htm">
      <IsDefault>false</IsDefault>
      <HtmlFileName>R1.htm</HtmlFileName>
      <LongName>0000001 - Document - Cover Page</LongName>
      <ShortName>Cover Page</ShortName>
      <MenuCategory>Cover</MenuCategory>
      <Position>1</Position>
    </Report>
    <Report instance="msft-20230630.htm">
      <HtmlFileName>R2.htm</HtmlFileName>
      <ShortName>INCOME STATEMENTS</ShortName>
      <MenuCategory>Statements</MenuCategory>
    </Report>
    <Report instance="msft-20230630.htm">
      <HtmlFileName>R4.htm</HtmlFileName>
      <ShortName>Balance Sheets</ShortName>
      <MenuCategory>Statements</MenuCategory>
    </Report>
    <Report instance="msft-20230630.htm">
      <XmlFileName>R5.xml</XmlFileName>
      <ShortName>Cash Flows Statements</ShortName>
    </Report>
    <Report>
      <ShortName>No File</ShortName>
    </Report>
    <Report>
      <LongName>All Reports</LongName>
      <ShortName>All Reports</ShortName>
      <Position>99</Position>
    </Report>
  </MyReports>
</FilingSummary>"#;

    #[test]
    fn test_manifest_maps_uppercased_names_to_files() {
        let map = parse_manifest(MANIFEST).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("INCOME STATEMENTS").unwrap().file_name, "R2.htm");
        assert_eq!(map.get("balance sheets").unwrap().file_name, "R4.htm");
        assert_eq!(map.get("CASH FLOWS STATEMENTS").unwrap().file_name, "R5.xml");
        assert_eq!(map.get("COVER PAGE").unwrap().category.as_deref(), Some("Cover"));
        assert!(map.get("ALL REPORTS").is_none());
        assert!(map.get("NO FILE").is_none());
    }

    #[test]
    fn test_manifest_preserves_order() {
        let map = parse_manifest(MANIFEST).unwrap();
        let files: Vec<_> = map.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(files, vec!["R1.htm", "R2.htm", "R4.htm", "R5.xml"]);
    }

    #[test]
    fn test_manifest_without_reports_is_empty_map() {
        let empty = "<FilingSummary><MyReports></MyReports></FilingSummary>";
        assert!(parse_manifest(empty).unwrap().is_empty());

        let only_trailer = "<FilingSummary><MyReports><Report><ShortName>All Reports</ShortName></Report></MyReports></FilingSummary>";
        assert!(parse_manifest(only_trailer).unwrap().is_empty());
    }

    #[test]
    fn test_manifest_without_container_is_error() {
        let err = parse_manifest("<FilingSummary><Version>1</Version></FilingSummary>").unwrap_err();
        assert!(matches!(err, ExtractError::ManifestParse(_)));
        assert!(matches!(parse_manifest("not xml <"), Err(ExtractError::ManifestParse(_))));
    }

    #[test]
    fn test_fetch_statement_map_reads_filing_summary() {
        let base = FilingBase("https://www.sec.gov/Archives/edgar/data/1/0001".to_string());
        let archive = MemoryArchive::new().with_page(base.manifest_url(), MANIFEST);
        let map = tokio_test::block_on(fetch_statement_map(&archive, &base)).unwrap();
        assert_eq!(map.len(), 4);

        let missing = FilingBase("https://www.sec.gov/Archives/edgar/data/1/0002".to_string());
        assert!(tokio_test::block_on(fetch_statement_map(&archive, &missing)).is_err());
    }
}
