// src/extractors/locate.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

// --- Raw Extraction Types ---

/// One tide reading as raw text, exactly as it appeared in the markup.
/// Normalization into typed fields happens downstream.
#[derive(Debug, Clone)]
pub struct RawTideRow {
    pub kind: String,
    pub time: String,
    pub height: String,
}

impl RawTideRow {
    /// A row is worth keeping when its time and height cells carry text.
    /// The kind cell may be empty; classification has a default for it.
    pub fn is_usable(&self) -> bool {
        !self.time.trim().is_empty() && !self.height.trim().is_empty()
    }
}

/// A group of raw rows that belong to one calendar day, together with the
/// heading text the date will be resolved from (when the page had one).
#[derive(Debug, Clone)]
pub struct RawDayBlock {
    pub heading: Option<String>,
    pub rows: Vec<RawTideRow>,
}

// --- Selectors (Lazy Static) ---
static DAY_BLOCK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tide-day").expect("Failed to parse day block selector"));

static DAY_DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tide-day__date").expect("Failed to parse day date selector"));

static TIDE_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tide-day__tide").expect("Failed to parse tide cell selector"));

static TYPE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tide-day__type").expect("Failed to parse type selector"));

static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tide-day__time").expect("Failed to parse time selector"));

static HEIGHT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".tide-day__height").expect("Failed to parse height selector"));

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to parse table selector"));

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to parse row selector"));

static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("Failed to parse cell selector"));

static CAPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("caption").expect("Failed to parse caption selector"));

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("Failed to parse heading selector"));

// "Tide times for <location>" / "Tide times and heights for <location>".
static TIDE_TIMES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btide\s+times?(?:\s+and\s+heights?)?\s+for\b")
        .expect("Failed to compile TIDE_TIMES_RE")
});

// --- Location Strategies ---

/// A way of finding day blocks in a parsed document. Strategies run in a
/// fixed order and the first one to produce usable rows wins, so adding a
/// strategy never changes the outcome for pages an earlier one handles.
trait LocateStrategy {
    fn name(&self) -> &'static str;
    fn locate(&self, document: &Html) -> Vec<RawDayBlock>;
}

/// Dedicated day-block markup: a container per day, one child element per
/// tide with separate type/time/height cells. The richest variant and the
/// most reliable, hence first in the chain.
struct DayBlockStrategy;

impl LocateStrategy for DayBlockStrategy {
    fn name(&self) -> &'static str {
        "day-blocks"
    }

    fn locate(&self, document: &Html) -> Vec<RawDayBlock> {
        let mut blocks = Vec::new();

        for day in document.select(&DAY_BLOCK_SELECTOR) {
            let heading = day.select(&DAY_DATE_SELECTOR).next().map(element_text);

            let mut rows: Vec<RawTideRow> = day
                .select(&TIDE_CELL_SELECTOR)
                .map(|cell| RawTideRow {
                    kind: first_text(cell, &TYPE_SELECTOR),
                    time: first_text(cell, &TIME_SELECTOR),
                    height: first_text(cell, &HEIGHT_SELECTOR),
                })
                .collect();

            // Some page variants keep the day container but render the
            // readings as a plain table inside it.
            if rows.is_empty() {
                let table = if TABLE_SELECTOR.matches(&day) {
                    Some(day)
                } else {
                    day.select(&TABLE_SELECTOR).next()
                };
                if let Some(table) = table {
                    rows = table_rows(table);
                }
            }

            blocks.push(RawDayBlock { heading, rows });
        }

        blocks
    }
}

/// Generic tables whose text mentions a tide state and a height marker.
/// Catches pages that dropped the dedicated classes but still publish a
/// recognizable data table.
struct MarkerTableStrategy;

impl LocateStrategy for MarkerTableStrategy {
    fn name(&self) -> &'static str {
        "marker-tables"
    }

    fn locate(&self, document: &Html) -> Vec<RawDayBlock> {
        let mut blocks = Vec::new();

        for table in document.select(&TABLE_SELECTOR) {
            // Layout tables wrap the real data table; only the innermost
            // candidates are scored, so each row is counted once.
            if table.select(&TABLE_SELECTOR).next().is_some() {
                continue;
            }

            let text = element_text(table).to_lowercase();
            let has_state = text.contains("high") || text.contains("low");
            let has_height_marker =
                text.contains("(m)") || text.contains("(ft)") || text.contains("height");
            if !has_state || !has_height_marker {
                continue;
            }

            let heading = table
                .select(&CAPTION_SELECTOR)
                .next()
                .map(element_text)
                .or_else(|| preceding_heading(table));

            blocks.push(RawDayBlock {
                heading,
                rows: table_rows(table),
            });
        }

        blocks
    }
}

/// Last resort: a heading announcing tide times ("Tide times for ...")
/// followed by a table among its next siblings.
struct HeadingTableStrategy;

impl LocateStrategy for HeadingTableStrategy {
    fn name(&self) -> &'static str {
        "heading-tables"
    }

    fn locate(&self, document: &Html) -> Vec<RawDayBlock> {
        let mut blocks = Vec::new();

        for heading in document.select(&HEADING_SELECTOR) {
            let text = element_text(heading);
            if !TIDE_TIMES_RE.is_match(&text) {
                continue;
            }
            if let Some(table) = following_table(heading) {
                blocks.push(RawDayBlock {
                    heading: Some(text),
                    rows: table_rows(table),
                });
            }
        }

        blocks
    }
}

// --- Strategy Chain ---

/// Finds the day blocks of a tide page, trying each location strategy in
/// fixed order and returning the first non-empty result after unusable rows
/// are filtered out. Returns an empty vector when no strategy matched.
pub fn locate_day_blocks(document: &Html) -> Vec<RawDayBlock> {
    let strategies: [&dyn LocateStrategy; 3] =
        [&DayBlockStrategy, &MarkerTableStrategy, &HeadingTableStrategy];

    for strategy in strategies {
        let mut blocks = strategy.locate(document);
        for block in &mut blocks {
            block.rows.retain(RawTideRow::is_usable);
        }
        blocks.retain(|block| !block.rows.is_empty());

        if !blocks.is_empty() {
            let total_rows: usize = blocks.iter().map(|block| block.rows.len()).sum();
            info!(
                "Strategy '{}' located {} day block(s) with {} tide row(s)",
                strategy.name(),
                blocks.len(),
                total_rows
            );
            return blocks;
        }
        debug!("Strategy '{}' found no usable rows", strategy.name());
    }

    warn!("No location strategy found tide rows in the document");
    Vec::new()
}

// --- Table Helpers ---

/// Reads (kind, time, height) text triples out of a plain table. When the
/// first non-empty row is a recognizable header it fixes the column order
/// and is itself skipped; otherwise the conventional kind/time/height
/// order is assumed.
fn table_rows(table: ElementRef) -> Vec<RawTideRow> {
    let mut rows = Vec::new();
    let mut mapping: Option<(usize, usize, usize)> = None;
    let mut first_row = true;

    for row in table.select(&ROW_SELECTOR) {
        let cells: Vec<String> = row.select(&CELL_SELECTOR).map(element_text).collect();
        if cells.is_empty() {
            continue;
        }

        if first_row {
            first_row = false;
            if let Some(indices) = header_indices(&cells) {
                mapping = Some(indices);
                continue;
            }
        }

        let (kind, time, height) = mapping.unwrap_or((0, 1, 2));
        rows.push(RawTideRow {
            kind: cells.get(kind).cloned().unwrap_or_default(),
            time: cells.get(time).cloned().unwrap_or_default(),
            height: cells.get(height).cloned().unwrap_or_default(),
        });
    }

    rows
}

/// Works out which cell position holds each field from a header row.
/// Returns `(kind, time, height)` indices when the row names at least the
/// time and height columns; a missing kind column defaults to position 0.
fn header_indices(cells: &[String]) -> Option<(usize, usize, usize)> {
    let mut kind = None;
    let mut time = None;
    let mut height = None;

    for (index, cell) in cells.iter().enumerate() {
        let lower = cell.to_lowercase();
        if time.is_none() && lower.contains("time") {
            time = Some(index);
        } else if height.is_none()
            && (lower.contains("height") || lower.contains("(m)") || lower.contains("(ft)"))
        {
            height = Some(index);
        } else if kind.is_none()
            && (lower.contains("tide") || lower.contains("state") || lower.contains("type"))
        {
            kind = Some(index);
        }
    }

    match (time, height) {
        (Some(time), Some(height)) => Some((kind.unwrap_or(0), time, height)),
        _ => None,
    }
}

/// Searches the siblings after a heading for the table it announces. Gives
/// up at the next heading so a section never steals its neighbor's table.
fn following_table(heading: ElementRef) -> Option<ElementRef> {
    for sibling in heading.next_siblings() {
        if let Some(element) = ElementRef::wrap(sibling) {
            if HEADING_SELECTOR.matches(&element) {
                return None;
            }
            if TABLE_SELECTOR.matches(&element) {
                return Some(element);
            }
            if let Some(table) = element.select(&TABLE_SELECTOR).next() {
                return Some(table);
            }
        }
    }
    None
}

/// Looks for the nearest heading (or element with a date-like class) before
/// a table, first among the table's own siblings and then its parent's.
fn preceding_heading(table: ElementRef) -> Option<String> {
    let mut scope = Some(table);
    for _ in 0..2 {
        let element = scope?;
        for sibling in element.prev_siblings() {
            if let Some(candidate) = ElementRef::wrap(sibling) {
                if HEADING_SELECTOR.matches(&candidate) || has_date_class(&candidate) {
                    return Some(element_text(candidate));
                }
            }
        }
        scope = element.parent().and_then(ElementRef::wrap);
    }
    None
}

fn has_date_class(element: &ElementRef) -> bool {
    element
        .value()
        .attr("class")
        .map(|classes| classes.to_lowercase().contains("date"))
        .unwrap_or(false)
}

/// Collects an element's text with whitespace collapsed to single spaces.
fn element_text(element: ElementRef) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(scope: ElementRef, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}
