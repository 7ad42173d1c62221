//! Route timing client
//!
//! Thin wrapper around the route-timing endpoint: two coordinates and a
//! travel mode in, a duration in minutes out. The endpoint is an external
//! collaborator; only this call contract is relied upon.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::TripCraftConfig;
use crate::{Result, TripCraftError};

/// Travel modes supported by the timing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Walk,
    Drive,
    Transit,
}

impl TravelMode {
    /// Mode identifier as the timing endpoint expects it
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walk => "walk",
            TravelMode::Drive => "drive",
            TravelMode::Transit => "transit",
        }
    }
}

/// Abstraction over the route-timing collaborator
pub trait RouteTimeProvider {
    /// Minutes to travel between two coordinates with the given mode
    async fn travel_minutes(
        &self,
        mode: TravelMode,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Result<u32>;
}

/// HTTP client for the Tmap routing API
pub struct TmapRouteClient {
    client: Client,
    app_key: String,
    base_url: String,
}

impl TmapRouteClient {
    /// Create a new client from configuration
    pub fn new(config: &TripCraftConfig) -> Result<Self> {
        let app_key = config
            .tmap
            .app_key
            .clone()
            .ok_or_else(|| TripCraftError::config("Tmap app key is required"))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(
                config.tmap.connect_timeout_seconds.into(),
            ))
            .timeout(Duration::from_secs(config.tmap.read_timeout_seconds.into()))
            .user_agent(concat!("tripcraft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TripCraftError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            app_key,
            base_url: config.tmap.base_url.clone(),
        })
    }
}

impl RouteTimeProvider for TmapRouteClient {
    async fn travel_minutes(
        &self,
        mode: TravelMode,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Result<u32> {
        let url = format!(
            "{}/routes?mode={}&startX={from_lng}&startY={from_lat}&endX={to_lng}&endY={to_lat}",
            self.base_url,
            mode.as_str()
        );
        debug!("Requesting {} route time", mode.as_str());

        let response = self
            .client
            .get(&url)
            .header("appKey", &self.app_key)
            .send()
            .await
            .map_err(|e| TripCraftError::upstream(None, format!("route request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TripCraftError::upstream(Some(status.as_u16()), body));
        }

        let parsed: RouteResponse = response.json().await.map_err(|e| {
            TripCraftError::malformed_response(format!("unreadable route response: {e}"))
        })?;

        let seconds = parsed
            .features
            .first()
            .map(|feature| feature.properties.total_time)
            .ok_or_else(|| TripCraftError::malformed_response("no route in response"))?;

        Ok((seconds / 60) as u32)
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
struct RouteFeature {
    properties: RouteProperties,
}

#[derive(Debug, Deserialize)]
struct RouteProperties {
    #[serde(rename = "totalTime")]
    total_time: u64,
}
