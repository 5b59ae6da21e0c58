// src/extractors/trend.rs

// --- Imports ---
use crate::extractors::normalize::normalize_time;
use crate::forecast::models::{NextEvent, TideDay, TideEvent, TideKind, Trend, TrendState};
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns (Lazy Static) ---
// Live banner text: "The tide is currently rising".
static LIVE_STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btide\s+is\s+(?:currently\s+)?(rising|falling)\b")
        .expect("Failed to compile LIVE_STATE_RE")
});

// Explicit lookahead text: "Next high tide is at 4:27 PM".
static NEXT_EVENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bnext\s+(high|low)\s+tide\b.{0,80}?\b(\d{1,2}:\d{2})(?:\s*([ap])\.?m\.?)?")
        .expect("Failed to compile NEXT_EVENT_RE")
});

/// Trend hints the page states outright, scraped from its flattened text.
/// Either may be absent; both beat inference from the event sequence.
#[derive(Debug, Default)]
pub struct PageSignals {
    pub live_state: Option<TrendState>,
    pub explicit_next: Option<NextEvent>,
}

impl PageSignals {
    pub fn any(&self) -> bool {
        self.live_state.is_some() || self.explicit_next.is_some()
    }
}

/// Scrapes live-state and next-event phrases from flattened page text.
pub fn scan_signals(text: &str) -> PageSignals {
    let live_state = LIVE_STATE_RE.captures(text).map(|caps| {
        if caps[1].eq_ignore_ascii_case("rising") {
            TrendState::Rising
        } else {
            TrendState::Falling
        }
    });

    let explicit_next = NEXT_EVENT_RE.captures(text).and_then(|caps| {
        let raw_time = match caps.get(3) {
            Some(meridiem) => format!("{} {}m", &caps[2], meridiem.as_str().to_lowercase()),
            None => caps[2].to_string(),
        };
        let time_of_day = normalize_time(&raw_time)?;
        let kind = if caps[1].eq_ignore_ascii_case("high") {
            TideKind::HighWater
        } else {
            TideKind::LowWater
        };
        Some(NextEvent { kind, time_of_day })
    });

    PageSignals {
        live_state,
        explicit_next,
    }
}

/// Computes the trend from today's events and whatever the page stated.
///
/// `next` is the page's explicit next-event text when present, else the
/// earliest of today's events strictly after `now`, else absent. `state`
/// resolution order: the live banner, the direction implied by an explicit
/// next event (approaching high water means rising), the height slope across
/// the first two future events, `unknown`.
pub fn derive_trend(today: Option<&TideDay>, signals: &PageSignals, now: NaiveTime) -> Trend {
    let future: Vec<&TideEvent> = today
        .map(|day| {
            day.events
                .iter()
                .filter(|event| {
                    event_time(event)
                        .map(|time| time > now)
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();

    let next = signals.explicit_next.clone().or_else(|| {
        future.first().map(|event| NextEvent {
            kind: event.kind,
            time_of_day: event.time_of_day.clone(),
        })
    });

    let state = signals
        .live_state
        .or_else(|| {
            signals
                .explicit_next
                .as_ref()
                .map(|next| state_toward(next.kind))
        })
        .or_else(|| slope_state(&future))
        .unwrap_or(TrendState::Unknown);

    Trend { state, next }
}

fn event_time(event: &TideEvent) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(&event.time_of_day, "%H:%M").ok()
}

fn state_toward(kind: TideKind) -> TrendState {
    match kind {
        TideKind::HighWater => TrendState::Rising,
        TideKind::LowWater => TrendState::Falling,
    }
}

fn slope_state(future: &[&TideEvent]) -> Option<TrendState> {
    let first = future.first()?;
    let second = future.get(1)?;
    if second.height_meters > first.height_meters {
        Some(TrendState::Rising)
    } else if second.height_meters < first.height_meters {
        Some(TrendState::Falling)
    } else {
        None
    }
}
