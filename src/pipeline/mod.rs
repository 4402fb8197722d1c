// src/pipeline/mod.rs
use crate::dataset::{aggregate, Alignment, MasterDataset, NormalizedFilingTable};
use crate::edgar::client::Archive;
use crate::edgar::crawler;
use crate::edgar::lookup::TickerLookup;
use crate::edgar::models::{FilingBase, FilingReference, RegistrantKey};
use crate::extractors::{
    fetch_statement_map, normalize_filing, scrape_table, select_documents, DocumentSelection,
    RawTableRecord, StatementMap,
};
use crate::utils::error::{AppError, ExtractError, FilingError};
use crate::utils::html_debug;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use tracing::Instrument;

pub const DEFAULT_YEARS: usize = 2;
// Filings processed at once; the client's rate limiter still caps requests per second.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// What to extract and how to assemble it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of most recent annual reports to process.
    pub years: usize,
    pub concurrency: usize,
    pub selection: DocumentSelection,
    pub alignment: Alignment,
    /// When set, every scraped statement document is saved here with a row annotation.
    pub debug_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            years: DEFAULT_YEARS,
            concurrency: DEFAULT_CONCURRENCY,
            selection: DocumentSelection::default(),
            alignment: Alignment::default(),
            debug_dir: None,
        }
    }
}

/// A filing left out of the dataset, and why.
#[derive(Debug, Clone)]
pub struct SkippedFiling {
    pub filing: FilingReference,
    pub reason: String,
}

/// Outcome of a run: the dataset plus what was left out of it.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub registrant: RegistrantKey,
    pub dataset: MasterDataset,
    /// Period of each aggregated filing, most recent first.
    pub periods: Vec<NaiveDate>,
    pub skipped: Vec<SkippedFiling>,
}

/// Identifier in, multi-year dataset out.
pub struct Pipeline<'a> {
    archive: &'a dyn Archive,
    lookup: &'a TickerLookup,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(archive: &'a dyn Archive, lookup: &'a TickerLookup, config: PipelineConfig) -> Self {
        Self { archive, lookup, config }
    }

    /// Runs every stage for one identifier.
    ///
    /// Unknown identifiers and registrants without annual reports fail the run. A filing that
    /// fails on its own is logged, listed in [`RunReport::skipped`] and left out; the run
    /// only fails if every filing did.
    pub async fn run(&self, identifier: &str) -> Result<RunReport, AppError> {
        let registrant = self.lookup.resolve(identifier)?;
        tracing::info!("Resolved {}", registrant);

        let filings = crawler::find_annual_filings(self.archive, &registrant).await?;
        if filings.len() < self.config.years {
            tracing::warn!(
                "Only {} annual reports available, {} requested",
                filings.len(),
                self.config.years
            );
        }
        let selected: Vec<FilingReference> = filings.into_iter().take(self.config.years).collect();

        let key = &registrant;
        let outcomes: Vec<(FilingReference, Result<NormalizedFilingTable, FilingError>)> =
            stream::iter(selected)
                .map(|filing| {
                    let span = tracing::info_span!("filing", url = %filing.index_url);
                    async move {
                        let result = self.process_filing(key, &filing).await;
                        (filing, result)
                    }
                    .instrument(span)
                })
                .buffered(self.config.concurrency.max(1)) // keeps most-recent-first order
                .collect()
                .await;

        let mut tables = Vec::new();
        let mut skipped = Vec::new();
        for (filing, result) in outcomes {
            match result {
                Ok(table) => {
                    tracing::info!("Loaded {} ({} rows)", table.value_column, table.rows.len());
                    tables.push(table);
                }
                Err(e) => {
                    tracing::error!("Skipping filing {}: {}", filing.index_url, e);
                    skipped.push(SkippedFiling { filing, reason: e.to_string() });
                }
            }
        }

        if tables.is_empty() {
            return Err(AppError::Processing(format!(
                "Failed to extract statements from any of {} filings for {}",
                skipped.len(),
                registrant.ticker
            )));
        }

        tracing::info!(
            "Processing finished. Success: {}, Failures: {}",
            tables.len(),
            skipped.len()
        );
        Ok(RunReport {
            registrant,
            periods: tables.iter().map(|t| t.period).collect(),
            dataset: aggregate(&tables, self.config.alignment),
            skipped,
        })
    }

    /// Manifest -> statement documents -> normalized table for a single filing.
    pub async fn process_filing(
        &self,
        registrant: &RegistrantKey,
        filing: &FilingReference,
    ) -> Result<NormalizedFilingTable, FilingError> {
        let base = filing.base();

        let map = match self.config.selection {
            DocumentSelection::ByName => fetch_statement_map(self.archive, &base).await?,
            DocumentSelection::Slots { .. } => StatementMap::default(),
        };
        let documents = select_documents(&map, self.config.selection);
        tracing::debug!("Scraping {} statement documents from {}", documents.len(), base);

        let records = self.scrape_statements(registrant, &base, &documents).await;
        if records.is_empty() {
            return Err(ExtractError::EmptyFiling(filing.index_url.clone()).into());
        }

        Ok(normalize_filing(&records)?)
    }

    /// Fetches and scrapes each document in order. A document that can't be fetched or has no
    /// table is skipped; the rest of the filing is still used.
    async fn scrape_statements(
        &self,
        registrant: &RegistrantKey,
        base: &FilingBase,
        documents: &[String],
    ) -> Vec<RawTableRecord> {
        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            let html = match self.archive.fetch_text(&base.document_url(document)).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Cannot fetch {}: {}", document, e);
                    continue;
                }
            };

            if let Some(dir) = &self.config.debug_dir {
                let accession = base.as_str().rsplit('/').next().unwrap_or_default();
                let target = dir.join(registrant.ticker.to_uppercase()).join(accession);
                if let Err(e) = html_debug::save_statement_debug(&target, document, &html) {
                    tracing::warn!("Failed to create debug HTML for {}: {}", document, e);
                }
            }

            match scrape_table(&html, document) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping {}: {}", document, e),
            }
        }
        records
    }
}
