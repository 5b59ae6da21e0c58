// src/extractors/assemble.rs

// --- Imports ---
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use scraper::Html;
use tracing::{debug, info, warn};

use crate::extractors::dates::resolve_heading_date;
use crate::extractors::fallback;
use crate::extractors::locate::{self, RawDayBlock};
use crate::extractors::normalize::{normalize_row, BareUnit};
use crate::extractors::trend::{derive_trend, scan_signals};
use crate::forecast::models::{Forecast, ForecastMeta, TideDay, TideEvent};
use crate::utils::error::ExtractError;

/// Knobs for one extraction pass.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Unit assumed for heights that carry no unit marker.
    pub bare_unit: BareUnit,
    /// Hard cap on events kept per day, applied after sorting.
    pub max_events_per_day: usize,
    /// Below this many located rows the text fallback also runs.
    pub min_table_rows: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            bare_unit: BareUnit::Feet,
            max_events_per_day: 4,
            min_table_rows: 2,
        }
    }
}

/// Runs the whole extraction pipeline over one fetched page.
///
/// Locates day blocks in the markup, adds a text-scan fallback block when
/// the markup yielded fewer than `min_table_rows` rows, normalizes and
/// dates every block, and assembles the days in calendar order. Markup
/// blocks must carry a resolvable date heading; only the fallback block is
/// implicitly dated to the current day. Blocks are deduplicated per date
/// with the first writer winning; markup blocks are offered before the
/// fallback block, which keeps the table authoritative. Zero assembled
/// days is an error, never an empty document.
pub fn extract_forecast(
    html: &str,
    options: &ExtractOptions,
    now: DateTime<Tz>,
    meta: ForecastMeta,
) -> Result<Forecast, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let document = Html::parse_document(html);
    let today = now.date_naive();

    // Step 1: Locate day blocks in the markup
    let table_blocks = locate::locate_day_blocks(&document);
    let table_row_total: usize = table_blocks.iter().map(|block| block.rows.len()).sum();

    // Step 2: Flatten the page text once, shared by fallback and signals
    let text = fallback::collapsed_text(&document);

    // Step 3: Text fallback when the markup gave too little
    let mut fallback_blocks: Vec<RawDayBlock> = Vec::new();
    if table_row_total < options.min_table_rows {
        let rows = fallback::scan_events(&text, options.max_events_per_day);
        if !rows.is_empty() {
            info!(
                "Markup yielded {} row(s); text fallback contributed {}",
                table_row_total,
                rows.len()
            );
            fallback_blocks.push(RawDayBlock {
                heading: None,
                rows,
            });
        }
    }

    let had_rows = table_row_total > 0 || !fallback_blocks.is_empty();

    // Step 4: Normalize and date each block, first writer wins per date
    let mut days: BTreeMap<NaiveDate, TideDay> = BTreeMap::new();
    let blocks = table_blocks
        .iter()
        .map(|block| (block, false))
        .chain(fallback_blocks.iter().map(|block| (block, true)));
    for (block, from_fallback) in blocks {
        let date = match &block.heading {
            Some(heading) => match resolve_heading_date(heading) {
                Some(date) => date,
                None => {
                    warn!("Skipping day block with unresolvable heading '{}'", heading);
                    continue;
                }
            },
            // Only the fallback block may go undated; it always describes
            // the page's current day. An undated markup block is dropped.
            None if from_fallback => today,
            None => {
                debug!(
                    "Skipping undated markup block with {} row(s)",
                    block.rows.len()
                );
                continue;
            }
        };

        let mut events: Vec<TideEvent> = block
            .rows
            .iter()
            .filter_map(|row| normalize_row(row, options.bare_unit))
            .collect();
        if events.is_empty() {
            debug!("Day block for {} normalized to zero events", date);
            continue;
        }

        events.sort_by(|a, b| a.time_of_day.cmp(&b.time_of_day));
        if events.len() > options.max_events_per_day {
            warn!(
                "Capping {} event(s) on {} at {}",
                events.len(),
                date,
                options.max_events_per_day
            );
            events.truncate(options.max_events_per_day);
        }

        if days.contains_key(&date) {
            debug!("Ignoring later duplicate block for {}", date);
            continue;
        }
        days.insert(date, TideDay { date, events });
    }

    if days.is_empty() {
        return Err(if had_rows {
            ExtractError::NoEventsFound
        } else {
            ExtractError::NoDaysFound
        });
    }

    // Step 5: Trend, only when there is something to ground it in
    let signals = scan_signals(&text);
    let trend = if days.contains_key(&today) || signals.any() {
        Some(derive_trend(days.get(&today), &signals, now.time()))
    } else {
        None
    };

    let days: Vec<TideDay> = days.into_values().collect();
    info!(
        "Assembled {} day(s) with {} event(s) total",
        days.len(),
        days.iter().map(|day| day.events.len()).sum::<usize>()
    );

    Ok(Forecast { meta, days, trend })
}
