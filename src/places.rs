//! Place resolution client for the Kakao Local API
//!
//! Resolves generated place keywords to structured place records (keyword
//! and category search) and reverse-resolves coordinates to one of the
//! supported cities. Empty search results are a normal outcome here, not an
//! error; only transport and HTTP failures surface as errors.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::config::TripCraftConfig;
use crate::models::{CategoryGroup, City, NO_ADDRESS, ResolvedPlace};
use crate::{Result, TripCraftError};

/// Abstraction over the place-search collaborator
///
/// The raw operations map one-to-one onto upstream endpoints; the default
/// methods carry the shared resolution policies and work against any
/// implementation.
pub trait PlaceProvider {
    /// Reverse-geocode coordinates to a supported city
    async fn resolve_city(&self, lat: f64, lng: f64) -> Result<City>;

    /// Keyword search; first result matching the category filter, else the
    /// first result unconditionally
    async fn search(
        &self,
        keyword: &str,
        category: Option<CategoryGroup>,
    ) -> Result<Option<ResolvedPlace>>;

    /// Keyword search biased to a radius around a point; first result only
    async fn search_near(
        &self,
        keyword: &str,
        lat: f64,
        lng: f64,
        radius_m: u32,
    ) -> Result<Option<ResolvedPlace>>;

    /// Category search centered on a point, sorted by distance, capped at
    /// `limit` results
    async fn search_top_by_category(
        &self,
        lat: f64,
        lng: f64,
        category: CategoryGroup,
        limit: usize,
    ) -> Result<Vec<ResolvedPlace>>;

    /// Category search centered on a point, sorted by distance, uncapped
    async fn search_many_by_category(
        &self,
        lat: f64,
        lng: f64,
        category: CategoryGroup,
    ) -> Result<Vec<ResolvedPlace>>;

    /// Resolve a generated place keyword, preferring an explicit location
    /// hint when one is given
    async fn resolve_generated(
        &self,
        generated_name: &str,
        location_hint: Option<&str>,
        category: Option<CategoryGroup>,
    ) -> Result<Option<ResolvedPlace>> {
        if let Some(hint) = location_hint {
            if !hint.trim().is_empty() {
                if let Some(found) = self.search(hint, category).await? {
                    return Ok(Some(found));
                }
            }
        }
        self.search(generated_name, category).await
    }

    /// Resolve a hashtag keyword, falling back to an unlocated sentinel
    /// place when nothing is found
    async fn resolve_hashtag(&self, hashtag: &str) -> Result<ResolvedPlace> {
        if let Some(found) = self.search(hashtag, None).await? {
            return Ok(found);
        }
        Ok(ResolvedPlace {
            name: hashtag.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            address: NO_ADDRESS.to_string(),
            phone: String::new(),
            category_code: String::new(),
        })
    }

    /// Top places of a category around a city's center
    async fn search_top_in_city(
        &self,
        city: City,
        category: CategoryGroup,
        limit: usize,
    ) -> Result<Vec<ResolvedPlace>> {
        let center = self
            .search(city.display_name(), None)
            .await?
            .ok_or_else(|| {
                TripCraftError::resolution(format!(
                    "no center found for city {}",
                    city.display_name()
                ))
            })?;
        self.search_top_by_category(center.latitude, center.longitude, category, limit)
            .await
    }
}

/// HTTP client for the Kakao Local API
pub struct KakaoLocalClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl KakaoLocalClient {
    /// Create a new client from configuration
    pub fn new(config: &TripCraftConfig) -> Result<Self> {
        let api_key = config
            .kakao
            .api_key
            .clone()
            .ok_or_else(|| TripCraftError::config("Kakao API key is required"))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(
                config.kakao.connect_timeout_seconds.into(),
            ))
            .timeout(Duration::from_secs(config.kakao.read_timeout_seconds.into()))
            .user_agent(concat!("tripcraft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TripCraftError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.kakao.base_url.clone(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .send()
            .await
            .map_err(|e| {
                TripCraftError::resolution(format!("place search request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TripCraftError::resolution(format!(
                "place search returned {status}: {body}"
            )));
        }
        Ok(response)
    }

    async fn fetch_places(&self, url: &str) -> Result<Vec<wire::PlaceDocument>> {
        let parsed: wire::SearchResponse = self.fetch(url).await?.json().await.map_err(|e| {
            TripCraftError::resolution(format!("unreadable place search response: {e}"))
        })?;
        Ok(parsed.documents)
    }

    fn category_url(&self, lat: f64, lng: f64, category: CategoryGroup) -> String {
        format!(
            "{}/v2/local/search/category.json?category_group_code={}&x={lng}&y={lat}&radius=5000&sort=distance",
            self.base_url,
            category.code()
        )
    }
}

impl PlaceProvider for KakaoLocalClient {
    async fn resolve_city(&self, lat: f64, lng: f64) -> Result<City> {
        let url = format!(
            "{}/v2/local/geo/coord2regioncode.json?x={lng}&y={lat}",
            self.base_url
        );
        debug!("Reverse geocoding ({lat}, {lng})");

        let parsed: wire::RegionResponse = self.fetch(&url).await?.json().await.map_err(|e| {
            TripCraftError::resolution(format!("unreadable region response: {e}"))
        })?;

        let Some(region) = parsed.documents.first() else {
            return Err(TripCraftError::CityNotFound { lat, lng });
        };
        City::match_region(&region.region_2depth_name)
            .ok_or(TripCraftError::CityNotFound { lat, lng })
    }

    async fn search(
        &self,
        keyword: &str,
        category: Option<CategoryGroup>,
    ) -> Result<Option<ResolvedPlace>> {
        let mut url = format!(
            "{}/v2/local/search/keyword.json?query={}",
            self.base_url,
            urlencoding::encode(keyword)
        );
        if let Some(category) = category {
            url.push_str("&category_group_code=");
            url.push_str(category.code());
        }
        debug!("Keyword search for '{keyword}'");

        let documents = self.fetch_places(&url).await?;
        Ok(select_by_category(documents, category).map(ResolvedPlace::from))
    }

    async fn search_near(
        &self,
        keyword: &str,
        lat: f64,
        lng: f64,
        radius_m: u32,
    ) -> Result<Option<ResolvedPlace>> {
        let url = format!(
            "{}/v2/local/search/keyword.json?query={}&x={lng}&y={lat}&radius={radius_m}",
            self.base_url,
            urlencoding::encode(keyword)
        );
        debug!("Keyword search for '{keyword}' near ({lat}, {lng})");

        let documents = self.fetch_places(&url).await?;
        Ok(documents.into_iter().next().map(ResolvedPlace::from))
    }

    async fn search_top_by_category(
        &self,
        lat: f64,
        lng: f64,
        category: CategoryGroup,
        limit: usize,
    ) -> Result<Vec<ResolvedPlace>> {
        let documents = self.fetch_places(&self.category_url(lat, lng, category)).await?;
        Ok(documents
            .into_iter()
            .take(limit)
            .map(ResolvedPlace::from)
            .collect())
    }

    async fn search_many_by_category(
        &self,
        lat: f64,
        lng: f64,
        category: CategoryGroup,
    ) -> Result<Vec<ResolvedPlace>> {
        let documents = self.fetch_places(&self.category_url(lat, lng, category)).await?;
        Ok(documents.into_iter().map(ResolvedPlace::from).collect())
    }
}

/// First document whose category code equals the filter; when the filter
/// matches nothing, or no filter is given, the first document wins.
fn select_by_category(
    documents: Vec<wire::PlaceDocument>,
    category: Option<CategoryGroup>,
) -> Option<wire::PlaceDocument> {
    let Some(filter) = category else {
        return documents.into_iter().next();
    };
    match documents
        .iter()
        .position(|doc| doc.category_group_code.as_deref() == Some(filter.code()))
    {
        Some(pos) => documents.into_iter().nth(pos),
        None => documents.into_iter().next(),
    }
}

/// Response shapes of the Kakao Local API
mod wire {
    use serde::Deserialize;

    use crate::models::{NO_ADDRESS, ResolvedPlace};

    /// Keyword and category search response
    #[derive(Debug, Deserialize)]
    pub struct SearchResponse {
        #[serde(default)]
        pub documents: Vec<PlaceDocument>,
    }

    /// One place document; coordinates arrive as decimal strings
    /// (`x` = longitude, `y` = latitude)
    #[derive(Debug, Deserialize)]
    pub struct PlaceDocument {
        #[serde(default)]
        pub place_name: String,
        #[serde(default)]
        pub x: String,
        #[serde(default)]
        pub y: String,
        #[serde(default)]
        pub road_address_name: String,
        #[serde(default)]
        pub address_name: String,
        #[serde(default)]
        pub phone: String,
        #[serde(default)]
        pub category_group_code: Option<String>,
    }

    /// Reverse-geocode response
    #[derive(Debug, Deserialize)]
    pub struct RegionResponse {
        #[serde(default)]
        pub documents: Vec<RegionDocument>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RegionDocument {
        #[serde(default)]
        pub region_2depth_name: String,
    }

    impl From<PlaceDocument> for ResolvedPlace {
        fn from(doc: PlaceDocument) -> Self {
            let address = if !doc.road_address_name.trim().is_empty() {
                doc.road_address_name
            } else if !doc.address_name.trim().is_empty() {
                doc.address_name
            } else {
                NO_ADDRESS.to_string()
            };

            Self {
                name: doc.place_name,
                latitude: doc.y.parse().unwrap_or(0.0),
                longitude: doc.x.parse().unwrap_or(0.0),
                address,
                phone: doc.phone,
                category_code: doc.category_group_code.unwrap_or_default(),
            }
        }
    }
}
