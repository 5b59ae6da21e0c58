// src/forecast/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a tide event. There is no third category: anything that is not
/// recognizably a high water is classified as low water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideKind {
    HighWater,
    LowWater,
}

/// A single high- or low-water occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideEvent {
    /// Zero-padded 24-hour wall-clock time ("HH:MM")
    pub time_of_day: String,
    pub kind: TideKind,
    /// Height in meters (the canonical unit), rounded to 2 decimal places
    pub height_meters: f64,
}

/// All tide events for one calendar date, sorted ascending by time of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideDay {
    pub date: NaiveDate,
    pub events: Vec<TideEvent>,
}

/// Direction the tide is currently moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendState {
    Rising,
    Falling,
    Unknown,
}

/// The first tide event still ahead of the current instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextEvent {
    pub kind: TideKind,
    pub time_of_day: String,
}

/// Derived state for "today": direction plus the upcoming event, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub state: TrendState,
    pub next: Option<NextEvent>,
}

/// Request metadata supplied by the caller, not derived from the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMeta {
    pub location: String,
    /// IANA zone id the dates and times are expressed in (e.g. "Atlantic/Canary")
    pub timezone: String,
    pub generated_at: DateTime<Utc>,
}

/// Root output document: one run produces exactly one of these, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub meta: ForecastMeta,
    /// Non-empty on success; sorted ascending by calendar date
    pub days: Vec<TideDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_forecast(trend: Option<Trend>) -> Forecast {
        Forecast {
            meta: ForecastMeta {
                location: "Playa del Ingles".to_string(),
                timezone: "Atlantic/Canary".to_string(),
                generated_at: Utc.with_ymd_and_hms(2025, 10, 18, 6, 30, 0).unwrap(),
            },
            days: vec![TideDay {
                date: NaiveDate::from_ymd_opt(2025, 10, 18).unwrap(),
                events: vec![TideEvent {
                    time_of_day: "04:27".to_string(),
                    kind: TideKind::HighWater,
                    height_meters: 0.64,
                }],
            }],
            trend,
        }
    }

    #[test]
    fn test_forecast_wire_schema() {
        let forecast = sample_forecast(Some(Trend {
            state: TrendState::Rising,
            next: Some(NextEvent {
                kind: TideKind::LowWater,
                time_of_day: "10:31".to_string(),
            }),
        }));

        let json = serde_json::to_value(&forecast).unwrap();

        assert_eq!(json["meta"]["location"], "Playa del Ingles");
        assert_eq!(json["meta"]["timezone"], "Atlantic/Canary");
        assert!(json["meta"]["generatedAt"].is_string());
        assert_eq!(json["days"][0]["date"], "2025-10-18");
        assert_eq!(json["days"][0]["events"][0]["timeOfDay"], "04:27");
        assert_eq!(json["days"][0]["events"][0]["kind"], "HighWater");
        assert_eq!(json["days"][0]["events"][0]["heightMeters"], 0.64);
        assert_eq!(json["trend"]["state"], "rising");
        assert_eq!(json["trend"]["next"]["kind"], "LowWater");
    }

    #[test]
    fn test_trend_omitted_when_absent() {
        let json = serde_json::to_value(sample_forecast(None)).unwrap();
        assert!(json.get("trend").is_none());
    }

    #[test]
    fn test_forecast_roundtrip() {
        let forecast = sample_forecast(Some(Trend {
            state: TrendState::Falling,
            next: None,
        }));
        let json = serde_json::to_string(&forecast).unwrap();
        let parsed: Forecast = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, forecast);
    }
}
