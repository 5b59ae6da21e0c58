// src/extractors/normalize.rs

// --- Imports ---
use crate::extractors::locate::RawTideRow;
use crate::forecast::models::{TideEvent, TideKind};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Constants ---
const FEET_TO_METERS: f64 = 0.3048;

// --- Regex Patterns for Field Matching (Lazy Static) ---
// First clock-like token in a cell, with an optional meridiem marker
// ("4:27 AM", "4:27am", "11:50 p.m.", "23:50").
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2}):(\d{2})(?:\s*([ap])\.?m\.?)?").expect("Failed to compile TIME_RE")
});

// First signed decimal in a height cell, after ','->'.' normalization.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?").expect("Failed to compile NUMBER_RE")
});

// A meters marker: "m" directly after the number ("0.64m", "0.64 m") or a
// spelled-out word. A plain \b before the bare letter would also fire on the
// "m" of "am"/"pm", hence the digit-anchored alternative.
static METERS_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\d\s*|\b)m(?:eters?|etres?)?\b").expect("Failed to compile METERS_MARKER_RE")
});

static FEET_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\d\s*|\b)(?:ft|feet|foot)\b").expect("Failed to compile FEET_MARKER_RE")
});

// A decimal with its unit token directly attached ("2.13 ft", "0.65m").
// Dual-unit cells like "2.13 ft (0.65 m)" need each number paired with its
// own unit; a cell-wide marker would claim the first number for the wrong one.
static PAIRED_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*(m(?:eters?|etres?)?|ft|feet|foot)\b")
        .expect("Failed to compile PAIRED_VALUE_RE")
});

/// Unit assumed for height values that carry no unit marker at all. The
/// source page variants disagree on this, so it is an explicit choice:
/// feet matches the majority of observed pages and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BareUnit {
    Feet,
    Meters,
}

/// Converts a raw time token into zero-padded 24-hour "HH:MM".
///
/// "PM" adds 12 unless the hour is already 12; "12:xx AM" becomes "00:xx".
/// Without a meridiem marker the value is assumed to already be 24-hour.
/// Returns `None` for tokens that fit neither clock (hour > 12 with a
/// meridiem, hour > 23 or minute > 59 without).
pub fn normalize_time(raw: &str) -> Option<String> {
    let caps = TIME_RE.captures(raw)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if minute > 59 {
        return None;
    }

    let hour = match caps.get(3) {
        Some(meridiem) => {
            if hour > 12 {
                return None;
            }
            match (meridiem.as_str().to_lowercase().as_str(), hour) {
                ("a", 12) => 0,
                ("p", h) if h != 12 => h + 12,
                (_, h) => h,
            }
        }
        None => {
            if hour > 23 {
                return None;
            }
            hour
        }
    };

    Some(format!("{:02}:{:02}", hour, minute))
}

/// Converts a raw height cell into meters, rounded to 2 decimal places.
///
/// Accepts ',' or '.' as the decimal separator. A number with its own unit
/// token attached is read first, meters winning over feet when a cell shows
/// both renderings. Failing that, a detached marker anywhere in the cell
/// applies to the first number; with no marker at all the configured
/// `bare_unit` decides. Values that come out negative violate the
/// height invariant and are rejected.
pub fn normalize_height(raw: &str, bare_unit: BareUnit) -> Option<f64> {
    let cleaned = raw.replace(',', ".");

    let meters = match paired_value(&cleaned) {
        Some(meters) => meters,
        None => {
            let number = NUMBER_RE.find(&cleaned)?;
            let value: f64 = number.as_str().parse().ok()?;
            match height_unit(&cleaned).unwrap_or(bare_unit) {
                BareUnit::Meters => value,
                BareUnit::Feet => value * FEET_TO_METERS,
            }
        }
    };

    let rounded = round2(meters);
    if rounded < 0.0 {
        tracing::debug!("Rejecting negative height '{}'", raw.trim());
        return None;
    }
    Some(rounded)
}

/// Classifies the raw type cell: anything containing "high" is a high water,
/// everything else is a low water.
pub fn classify_kind(raw: &str) -> TideKind {
    if raw.to_lowercase().contains("high") {
        TideKind::HighWater
    } else {
        TideKind::LowWater
    }
}

/// Converts one raw text triple into a `TideEvent`.
///
/// Fails softly: an unparseable field drops the row (returning `None`) and
/// the batch continues. A row with a good time and type but no usable height
/// is also dropped - a tide reading without a height is not meaningful.
pub fn normalize_row(row: &RawTideRow, bare_unit: BareUnit) -> Option<TideEvent> {
    let time_of_day = match normalize_time(&row.time) {
        Some(time) => time,
        None => {
            tracing::debug!("Dropping row with unparseable time '{}'", row.time.trim());
            return None;
        }
    };
    let height_meters = match normalize_height(&row.height, bare_unit) {
        Some(height) => height,
        None => {
            tracing::debug!(
                "Dropping '{}' row at {}: unparseable height '{}'",
                row.kind.trim(),
                time_of_day,
                row.height.trim()
            );
            return None;
        }
    };

    Some(TideEvent {
        time_of_day,
        kind: classify_kind(&row.kind),
        height_meters,
    })
}

// Reads number-unit pairs, in meters. The first meters pair wins outright;
// otherwise the first feet pair is converted.
fn paired_value(text: &str) -> Option<f64> {
    let mut feet = None;
    for caps in PAIRED_VALUE_RE.captures_iter(text) {
        let value: f64 = match caps[1].parse() {
            Ok(value) => value,
            Err(_) => continue,
        };
        if caps[2].to_lowercase().starts_with('m') {
            return Some(value);
        }
        if feet.is_none() {
            feet = Some(value * FEET_TO_METERS);
        }
    }
    feet
}

fn height_unit(text: &str) -> Option<BareUnit> {
    if METERS_MARKER_RE.is_match(text) {
        return Some(BareUnit::Meters);
    }
    if FEET_MARKER_RE.is_match(text) {
        return Some(BareUnit::Feet);
    }
    None
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, time: &str, height: &str) -> RawTideRow {
        RawTideRow {
            kind: kind.to_string(),
            time: time.to_string(),
            height: height.to_string(),
        }
    }

    #[test]
    fn test_time_meridiem_conversion() {
        assert_eq!(normalize_time("4:27 AM").as_deref(), Some("04:27"));
        assert_eq!(normalize_time("4:27 PM").as_deref(), Some("16:27"));
        assert_eq!(normalize_time("11:50 PM").as_deref(), Some("23:50"));
        assert_eq!(normalize_time("11:50pm").as_deref(), Some("23:50"));
        assert_eq!(normalize_time("9:05 a.m.").as_deref(), Some("09:05"));
    }

    #[test]
    fn test_time_noon_and_midnight_boundaries() {
        assert_eq!(normalize_time("12:15 AM").as_deref(), Some("00:15"));
        assert_eq!(normalize_time("12:15 PM").as_deref(), Some("12:15"));
    }

    #[test]
    fn test_time_without_meridiem_is_already_24h() {
        assert_eq!(normalize_time("23:50").as_deref(), Some("23:50"));
        assert_eq!(normalize_time("09:05").as_deref(), Some("09:05"));
        assert_eq!(normalize_time("9:05").as_deref(), Some("09:05"));
    }

    #[test]
    fn test_time_rejects_impossible_clocks() {
        assert_eq!(normalize_time("24:00"), None);
        assert_eq!(normalize_time("13:00 PM"), None);
        assert_eq!(normalize_time("7:61 AM"), None);
        assert_eq!(normalize_time("no time here"), None);
    }

    #[test]
    fn test_height_feet_conversion() {
        // 2.1 ft * 0.3048 = 0.64008 -> 0.64
        assert_eq!(normalize_height("2.1 ft", BareUnit::Feet), Some(0.64));
        assert_eq!(normalize_height("6.20ft", BareUnit::Feet), Some(1.89));
        assert_eq!(normalize_height("3 feet", BareUnit::Meters), Some(0.91));
        // Marker detached from the number still counts.
        assert_eq!(normalize_height("2.1 (ft)", BareUnit::Meters), Some(0.64));
    }

    #[test]
    fn test_height_dual_unit_pairs_number_with_its_unit() {
        // Both renderings in one cell: the meter figure must win, in either
        // order, instead of the first number being read as meters.
        assert_eq!(normalize_height("2.13 ft (0.65 m)", BareUnit::Feet), Some(0.65));
        assert_eq!(normalize_height("0.65 m (2.13 ft)", BareUnit::Feet), Some(0.65));
    }

    #[test]
    fn test_height_meters_passthrough() {
        assert_eq!(normalize_height("0.64 m", BareUnit::Feet), Some(0.64));
        assert_eq!(normalize_height("0.64m", BareUnit::Feet), Some(0.64));
        assert_eq!(normalize_height("1.2 meters", BareUnit::Feet), Some(1.2));
        assert_eq!(normalize_height("1.2 metres", BareUnit::Feet), Some(1.2));
    }

    #[test]
    fn test_height_comma_decimal_separator() {
        assert_eq!(normalize_height("0,64 m", BareUnit::Feet), Some(0.64));
        assert_eq!(normalize_height("6,20", BareUnit::Meters), Some(6.2));
    }

    #[test]
    fn test_height_bare_value_uses_configured_unit() {
        assert_eq!(normalize_height("2.1", BareUnit::Feet), Some(0.64));
        assert_eq!(normalize_height("2.1", BareUnit::Meters), Some(2.1));
    }

    #[test]
    fn test_height_rejects_garbage_and_negatives() {
        assert_eq!(normalize_height("n/a", BareUnit::Feet), None);
        assert_eq!(normalize_height("-0.2 m", BareUnit::Feet), None);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(classify_kind("High Tide"), TideKind::HighWater);
        assert_eq!(classify_kind("HIGH"), TideKind::HighWater);
        assert_eq!(classify_kind("Low Tide"), TideKind::LowWater);
        assert_eq!(classify_kind("whatever"), TideKind::LowWater);
    }

    #[test]
    fn test_normalize_row_scenario_high_meters() {
        let event = normalize_row(&row("High Tide", "4:27 AM", "0.64 m"), BareUnit::Feet).unwrap();
        assert_eq!(event.time_of_day, "04:27");
        assert_eq!(event.kind, TideKind::HighWater);
        assert_eq!(event.height_meters, 0.64);
    }

    #[test]
    fn test_normalize_row_scenario_low_feet() {
        let event = normalize_row(&row("Low Tide", "11:50 PM", "2.1 ft"), BareUnit::Feet).unwrap();
        assert_eq!(event.time_of_day, "23:50");
        assert_eq!(event.kind, TideKind::LowWater);
        assert_eq!(event.height_meters, 0.64);
    }

    #[test]
    fn test_normalize_row_drops_rows_without_height() {
        // Parseable time and type, no height: not a meaningful tide reading.
        assert!(normalize_row(&row("High Tide", "4:27 AM", ""), BareUnit::Feet).is_none());
        assert!(normalize_row(&row("Low", "bad", "0.64 m"), BareUnit::Feet).is_none());
    }
}
