// src/extractors/dates.rs

// --- Imports ---
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns for Heading Dates (Lazy Static) ---
// "18 October 2025", "18th Oct. 2025" (day-first, European order).
static DAY_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})\.?\s+(\d{4})\b")
        .expect("Failed to compile DAY_FIRST_RE")
});

// "October 18, 2025", "Oct 18 2025" (month-first, US order).
static MONTH_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b")
        .expect("Failed to compile MONTH_FIRST_RE")
});

const MONTHS: [(&str, u32); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Pulls a calendar date out of a day-block heading.
///
/// Headings arrive with arbitrary decoration ("Tide Times for Playa del
/// Ingles: Saturday 18 October 2025"), so this scans for the first token run
/// that reads as a date rather than anchoring to the whole string. Day-first
/// order is tried before month-first because the source favors it. Month
/// names resolve by fixed English lookup, never by system locale. Returns
/// `None` when no candidate run forms a valid calendar date.
pub fn resolve_heading_date(heading: &str) -> Option<NaiveDate> {
    for caps in DAY_FIRST_RE.captures_iter(heading) {
        let day: u32 = match caps[1].parse() {
            Ok(day) => day,
            Err(_) => continue,
        };
        let year: i32 = match caps[3].parse() {
            Ok(year) => year,
            Err(_) => continue,
        };
        if let Some(month) = month_number(&caps[2]) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    for caps in MONTH_FIRST_RE.captures_iter(heading) {
        let day: u32 = match caps[2].parse() {
            Ok(day) => day,
            Err(_) => continue,
        };
        let year: i32 = match caps[3].parse() {
            Ok(year) => year,
            Err(_) => continue,
        };
        if let Some(month) = month_number(&caps[1]) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    None
}

/// Maps an English month name or unambiguous abbreviation (3+ letters,
/// optional trailing dot) to its 1-12 number.
fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim_end_matches('.').to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .find(|(month, _)| month.starts_with(lower.as_str()))
        .map(|(_, number)| *number)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_first_heading() {
        assert_eq!(
            resolve_heading_date("Saturday 18 October 2025"),
            NaiveDate::from_ymd_opt(2025, 10, 18)
        );
        assert_eq!(
            resolve_heading_date("1st March 2026"),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
    }

    #[test]
    fn test_month_first_heading() {
        assert_eq!(
            resolve_heading_date("October 18, 2025"),
            NaiveDate::from_ymd_opt(2025, 10, 18)
        );
        assert_eq!(
            resolve_heading_date("Oct 18 2025"),
            NaiveDate::from_ymd_opt(2025, 10, 18)
        );
    }

    #[test]
    fn test_abbreviated_month_with_dot() {
        assert_eq!(
            resolve_heading_date("Sun 19 Oct. 2025"),
            NaiveDate::from_ymd_opt(2025, 10, 19)
        );
        assert_eq!(
            resolve_heading_date("Sept 3 2025"),
            NaiveDate::from_ymd_opt(2025, 9, 3)
        );
    }

    #[test]
    fn test_decorated_heading_text() {
        assert_eq!(
            resolve_heading_date("Tide Times for Playa del Ingles: Saturday 18 October 2025"),
            NaiveDate::from_ymd_opt(2025, 10, 18)
        );
    }

    #[test]
    fn test_resolution_is_stable_across_runs() {
        let heading = "Saturday 18 October 2025";
        assert_eq!(
            resolve_heading_date(heading),
            resolve_heading_date(heading)
        );
    }

    #[test]
    fn test_unparseable_headings_yield_none() {
        assert_eq!(resolve_heading_date("Tomorrow"), None);
        assert_eq!(resolve_heading_date("18/10/2025"), None);
        assert_eq!(resolve_heading_date(""), None);
    }

    #[test]
    fn test_impossible_calendar_dates_rejected() {
        assert_eq!(resolve_heading_date("30 February 2025"), None);
        assert_eq!(resolve_heading_date("32 October 2025"), None);
    }

    #[test]
    fn test_month_lookup_requires_three_letters() {
        assert_eq!(month_number("october"), Some(10));
        assert_eq!(month_number("oct"), Some(10));
        assert_eq!(month_number("Oct."), Some(10));
        assert_eq!(month_number("oc"), None);
    }
}
