// src/forecast/client.rs
use crate::utils::error::FetchError;
use reqwest::header;
use std::time::Duration;

const TIDE_FORECAST_BASE_URL: &str = "https://www.tide-forecast.com";

// tide-forecast.com serves an interstitial page to clients without a
// browser-style User-Agent, so identify as one.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Builds the canonical page URL for a location slug
/// (e.g. "Playa-del-Ingles").
pub fn page_url(location: &str) -> String {
    format!("{}/locations/{}/tides/latest", TIDE_FORECAST_BASE_URL, location)
}

/// Creates a reqwest client configured for the tide-forecast site.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Downloads the tide page for one location and returns its HTML body.
///
/// Non-2xx responses and transport errors are fatal to the run: retry, if
/// desired, belongs to the caller, never to this function.
pub async fn fetch_tide_page(url: &str) -> Result<String, FetchError> {
    let client = build_client()?; // Propagate client build error if any

    tracing::info!("Downloading tide page from: {}", url);

    let response = client
        .get(url)
        .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
        .send()
        .await?; // Propagates reqwest::Error as FetchError::Network

    // Check if the request was successful (status code 2xx)
    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::FORBIDDEN {
            tracing::warn!("Received 403 Forbidden - the User-Agent may be rejected.");
            return Err(FetchError::Blocked);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!("Received 404 Not Found for URL: {}", url);
            return Err(FetchError::LocationNotFound(url.to_string()));
        }
        // Return generic HTTP error
        return Err(FetchError::Http(status));
    }

    // Read the response body as text
    let body = response.text().await?;
    tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}
