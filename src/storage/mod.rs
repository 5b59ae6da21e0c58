// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::forecast::models::Forecast;
use crate::utils::error::StorageError;

const FORECAST_FILENAME: &str = "latest.json";
const RAW_PAGE_FILENAME: &str = "raw_page.html";

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager rooted at the given directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    /// Serializes the forecast and writes it to `latest.json`.
    ///
    /// Callers only reach this with a successfully assembled forecast, so a
    /// previously good file is never replaced by an empty one.
    pub fn save_forecast(&self, forecast: &Forecast) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(FORECAST_FILENAME);

        let json = serde_json::to_string_pretty(forecast)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved forecast to {}", file_path.display());

        Ok(file_path)
    }

    /// Saves the fetched HTML next to the forecast for offline inspection
    pub fn save_raw_page(&self, html: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(RAW_PAGE_FILENAME);

        fs::write(&file_path, html).map_err(StorageError::IoError)?;

        tracing::info!("Saved raw page to {}", file_path.display());

        Ok(file_path)
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::models::{ForecastMeta, TideDay, TideEvent, TideKind};
    use chrono::{NaiveDate, Utc};

    fn sample_forecast() -> Forecast {
        Forecast {
            meta: ForecastMeta {
                location: "Playa del Ingles".to_string(),
                timezone: "Atlantic/Canary".to_string(),
                generated_at: Utc::now(),
            },
            days: vec![TideDay {
                date: NaiveDate::from_ymd_opt(2025, 10, 18).unwrap(),
                events: vec![TideEvent {
                    time_of_day: "04:27".to_string(),
                    kind: TideKind::HighWater,
                    height_meters: 0.64,
                }],
            }],
            trend: None,
        }
    }

    #[test]
    fn test_new_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("tides");

        let manager = StorageManager::new(&nested).unwrap();
        assert!(nested.is_dir());

        let path = manager.save_forecast(&sample_forecast()).unwrap();
        assert!(path.ends_with("latest.json"));
        assert!(path.is_file());
    }

    #[test]
    fn test_saved_forecast_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::new(dir.path()).unwrap();

        let path = manager.save_forecast(&sample_forecast()).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        let parsed: Forecast = serde_json::from_str(&contents).unwrap();

        assert_eq!(parsed.days.len(), 1);
        assert_eq!(parsed.days[0].events[0].time_of_day, "04:27");
        assert!(contents.contains("\"heightMeters\": 0.64"));
    }

    #[test]
    fn test_save_overwrites_previous_forecast() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::new(dir.path()).unwrap();

        let first = manager.save_forecast(&sample_forecast()).unwrap();
        let mut updated = sample_forecast();
        updated.days[0].events[0].time_of_day = "05:00".to_string();
        let second = manager.save_forecast(&updated).unwrap();

        assert_eq!(first, second);
        let contents = fs::read_to_string(second).unwrap();
        assert!(contents.contains("05:00"));
        assert!(!contents.contains("04:27"));
    }

    #[test]
    fn test_save_raw_page() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::new(dir.path()).unwrap();

        let path = manager.save_raw_page("<html><body>tides</body></html>").unwrap();
        assert!(path.ends_with("raw_page.html"));
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("tides"));
    }
}
