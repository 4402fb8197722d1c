// src/extractors/table.rs
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to compile TABLE_SELECTOR"));

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));

static HEADER_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("Failed to compile HEADER_CELL_SELECTOR"));

static DATA_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile DATA_CELL_SELECTOR"));

// Statement renderings mark section labels ("Assets", "Current liabilities:") in bold.
static EMPHASIS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("strong").expect("Failed to compile EMPHASIS_SELECTOR"));

/// The three shapes a statement table row can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    SectionLabel,
    Data,
}

/// Classification rule for statement rows. Header cells win over emphasis.
pub fn classify_markers(has_header_cells: bool, has_emphasis: bool) -> RowKind {
    match (has_header_cells, has_emphasis) {
        (true, _) => RowKind::Header,
        (false, true) => RowKind::SectionLabel,
        (false, false) => RowKind::Data,
    }
}

/// A row together with the text it contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedRow {
    Header(Vec<String>),
    SectionLabel(String),
    Data(Vec<String>),
}

impl ClassifiedRow {
    pub fn kind(&self) -> RowKind {
        match self {
            ClassifiedRow::Header(_) => RowKind::Header,
            ClassifiedRow::SectionLabel(_) => RowKind::SectionLabel,
            ClassifiedRow::Data(_) => RowKind::Data,
        }
    }
}

/// Rows of one statement document, split by kind. Order within each list follows the
/// document; the interleaving between lists is not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTableRecord {
    pub document: String,
    pub headers: Vec<Vec<String>>,
    pub sections: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl RawTableRecord {
    pub fn push(&mut self, row: ClassifiedRow) {
        match row {
            ClassifiedRow::Header(cells) => self.headers.push(cells),
            ClassifiedRow::SectionLabel(label) => self.sections.push(label),
            ClassifiedRow::Data(cells) => self.data.push(cells),
        }
    }
}

// Text of `cell` that belongs to `table`; text of tables nested in the cell is left out.
fn cell_text(cell: ElementRef, table: Option<ElementRef>) -> String {
    cell.descendants()
        .filter(|node| node.parent().and_then(ElementRef::wrap).and_then(owning_table) == table)
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Classifies a single `<tr>`. Only cells and emphasis of the row's own table count; a
/// table nested inside a cell contributes nothing. A row without any cell (markup the HTML
/// parser moved out of the table leaves these behind) fits none of the kinds and is rejected.
pub fn classify_row(row: ElementRef, index: usize) -> Result<ClassifiedRow, ExtractError> {
    let table = owning_table(row);
    let own = |el: &ElementRef| owning_table(*el) == table;

    let header_cells: Vec<_> = row.select(&HEADER_CELL_SELECTOR).filter(|c| own(c)).collect();
    let data_cells: Vec<_> = row.select(&DATA_CELL_SELECTOR).filter(|c| own(c)).collect();
    if header_cells.is_empty() && data_cells.is_empty() {
        return Err(ExtractError::RowClassification {
            index,
            reason: "row has no cells".to_string(),
        });
    }
    let has_emphasis = row.select(&EMPHASIS_SELECTOR).any(|strong| own(&strong));

    let text = |cell: ElementRef| cell_text(cell, table);
    let classified = match classify_markers(!header_cells.is_empty(), has_emphasis) {
        RowKind::Header => ClassifiedRow::Header(header_cells.into_iter().map(text).collect()),
        RowKind::SectionLabel => {
            ClassifiedRow::SectionLabel(data_cells.first().map(|c| text(*c)).unwrap_or_default())
        }
        RowKind::Data => ClassifiedRow::Data(data_cells.into_iter().map(text).collect()),
    };
    Ok(classified)
}

/// Classifies every row of the document's first table. Rows of tables nested inside it
/// (footnote blocks) are not part of the statement and are not returned.
pub fn classify_rows(
    html: &str,
    document: &str,
) -> Result<Vec<Result<ClassifiedRow, ExtractError>>, ExtractError> {
    let parsed = Html::parse_document(html);
    let table = parsed
        .select(&TABLE_SELECTOR)
        .next()
        .ok_or_else(|| ExtractError::TableNotFound(document.to_string()))?;

    let rows = table
        .select(&ROW_SELECTOR)
        .filter(|row| owning_table(*row) == Some(table))
        .enumerate()
        .map(|(index, row)| classify_row(row, index))
        .collect();
    Ok(rows)
}

fn owning_table(row: ElementRef) -> Option<ElementRef> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

/// Scrapes one statement document into a [`RawTableRecord`]. Unclassifiable rows are
/// logged and skipped.
pub fn scrape_table(html: &str, document: &str) -> Result<RawTableRecord, ExtractError> {
    let mut record = RawTableRecord { document: document.to_string(), ..Default::default() };

    for row in classify_rows(html, document)? {
        match row {
            Ok(row) => record.push(row),
            Err(e) => tracing::warn!("Skipping row in {}: {}", document, e),
        }
    }

    tracing::debug!(
        "Scraped {}: {} header rows, {} sections, {} data rows",
        document,
        record.headers.len(),
        record.sections.len(),
        record.data.len()
    );
    Ok(record)
}
