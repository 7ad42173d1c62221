//! Place detail service
//!
//! Enriches a single place with a model-written one-line description and a
//! located address found near the given coordinates.

use serde_json::Value;
use tracing::{debug, warn};

use crate::gemini::TextGenerator;
use crate::models::{PlaceDetail, PlaceDetailRequest};
use crate::places::PlaceProvider;
use crate::prompts;
use crate::{Result, TripCraftError};

/// Radius for locating the place around the request coordinates
const DETAIL_SEARCH_RADIUS_M: u32 = 1000;

/// Place detail service
pub struct PlaceDetailService<G, P> {
    generator: G,
    places: P,
}

impl<G, P> PlaceDetailService<G, P>
where
    G: TextGenerator,
    P: PlaceProvider,
{
    /// Create a new detail service over the two collaborators
    pub fn new(generator: G, places: P) -> Self {
        Self { generator, places }
    }

    /// Describe and locate one place
    pub async fn detail(&self, request: &PlaceDetailRequest) -> Result<PlaceDetail> {
        let prompt = prompts::build_description_prompt(&request.name, &request.category);
        let document = self
            .generator
            .generate_document(&prompt)
            .await
            .map_err(|e| TripCraftError::generation("describe", e))?;
        let description = document
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let located = self
            .places
            .search_near(
                &request.name,
                request.latitude,
                request.longitude,
                DETAIL_SEARCH_RADIUS_M,
            )
            .await
            .map_err(|e| TripCraftError::generation("locate", e))?;

        let (address, latitude, longitude) = match located {
            Some(place) => {
                debug!("Located '{}' at ({}, {})", request.name, place.latitude, place.longitude);
                (place.address, place.latitude, place.longitude)
            }
            None => {
                warn!("No nearby match for '{}'", request.name);
                (String::new(), 0.0, 0.0)
            }
        };

        Ok(PlaceDetail {
            name: request.name.clone(),
            category: request.category.clone(),
            description,
            address,
            latitude,
            longitude,
            estimated_cost: request.estimated_cost,
        })
    }
}
