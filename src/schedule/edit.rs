//! Itinerary edit pipeline
//!
//! Rebuilds a stop list from a free-text place-name list. Entries that
//! cannot be confidently resolved are dropped silently; the pipeline is
//! lossy by design and returns only what it could place on the map. A
//! route-timing failure does not drop the list either, it marks the
//! affected leg with the `-1` sentinel and moves on.

use serde_json::Value;
use tracing::{info, warn};

use crate::gemini::TextGenerator;
use crate::models::{EditResult, LegTimes, Stop};
use crate::places::PlaceProvider;
use crate::prompts;
use crate::routing::RouteTimeProvider;
use crate::schedule::measure_leg;
use crate::{Result, TripCraftError};

/// Itinerary edit service
pub struct ScheduleEditService<G, P, R> {
    generator: G,
    places: P,
    routes: R,
}

impl<G, P, R> ScheduleEditService<G, P, R>
where
    G: TextGenerator,
    P: PlaceProvider,
    R: RouteTimeProvider,
{
    /// Create a new edit service over the three collaborators
    pub fn new(generator: G, places: P, routes: R) -> Self {
        Self {
            generator,
            places,
            routes,
        }
    }

    /// Enrich and resolve an ordered place-name list into accepted stops
    /// plus their cost total
    pub async fn edit(&self, names: &[String]) -> Result<EditResult> {
        let prompt = prompts::build_edit_prompt(names);
        let raw = self.generator.generate(&prompt).await?;
        let entries = parse_entries(&raw)?;

        let mut stops: Vec<Stop> = Vec::with_capacity(entries.len());
        for entry in &entries {
            let requested = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim();
            if requested.is_empty() {
                continue;
            }

            let Some(place) = self.places.search(requested, None).await? else {
                warn!("Dropping '{requested}': no search result");
                continue;
            };
            if !names_related(&place.name, requested) {
                warn!(
                    "Dropping '{requested}': resolved to unrelated '{}'",
                    place.name
                );
                continue;
            }

            let travel = match stops.last() {
                Some(prev) if prev.has_coordinates() && place.has_coordinates() => {
                    self.leg_or_sentinel(
                        prev.latitude,
                        prev.longitude,
                        place.latitude,
                        place.longitude,
                    )
                    .await
                }
                _ => LegTimes::Unset,
            };

            stops.push(Stop {
                name: requested.to_string(),
                category: entry
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                latitude: place.latitude,
                longitude: place.longitude,
                address: place.address,
                phone: place.phone,
                estimated_cost: entry
                    .get("estimatedCost")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
                travel,
                hashtag: entry
                    .get("hashtag")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        info!("Accepted {} of {} edit entries", stops.len(), entries.len());
        Ok(EditResult {
            total_estimated_cost: stops.iter().map(|stop| stop.estimated_cost).sum(),
            places: stops,
        })
    }

    /// Timing failures are absorbed here: the leg is marked failed instead
    /// of aborting the pipeline
    async fn leg_or_sentinel(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> LegTimes {
        match measure_leg(&self.routes, from_lat, from_lng, to_lat, to_lng).await {
            Ok(times) => times,
            Err(e) => {
                warn!("Route timing failed, marking leg as failed: {e}");
                LegTimes::Failed
            }
        }
    }
}

/// Accept either a bare JSON array of place entries or an object carrying a
/// `places` array; any other shape violates the edit contract
fn parse_entries(raw: &str) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_str(raw).map_err(|e| {
        TripCraftError::invalid_edit_response(format!("edit payload is not valid JSON: {e}"))
    })?;
    match document {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut fields) => match fields.remove("places") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(TripCraftError::invalid_edit_response(
                "edit payload has no places array",
            )),
        },
        _ => Err(TripCraftError::invalid_edit_response(
            "edit payload is neither an array nor a places object",
        )),
    }
}

/// Bidirectional substring containment; rejects obviously wrong matches
fn names_related(resolved: &str, requested: &str) -> bool {
    resolved.contains(requested) || requested.contains(resolved)
}
