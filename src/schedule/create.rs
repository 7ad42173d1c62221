//! Itinerary generation pipeline
//!
//! Turns a destination/date-range request into a complete itinerary through
//! linear stages: validate → draft → resolve → time → cost → assemble. Any
//! failure after validation aborts the whole request and is reported as a
//! single stage-tagged failure; there is no partial-itinerary return path.

use chrono::Local;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::gemini::TextGenerator;
use crate::models::{CategoryGroup, DayBlock, Itinerary, ScheduleCreateRequest, Stop};
use crate::places::PlaceProvider;
use crate::prompts;
use crate::routing::RouteTimeProvider;
use crate::schedule::measure_leg;
use crate::{Result, TripCraftError};

/// Reserved top-level key of the cost document; not a date block
const TOTAL_COST_KEY: &str = "totalEstimatedCost";

/// Name and category label as emitted by the generator; discarded once the
/// place is resolved
#[derive(Debug, Clone)]
struct DraftPlace {
    name: String,
    category: String,
}

/// Itinerary generation service
pub struct ScheduleCreateService<G, P, R> {
    generator: G,
    places: P,
    routes: R,
}

impl<G, P, R> ScheduleCreateService<G, P, R>
where
    G: TextGenerator,
    P: PlaceProvider,
    R: RouteTimeProvider,
{
    /// Create a new generation service over the three collaborators
    pub fn new(generator: G, places: P, routes: R) -> Self {
        Self {
            generator,
            places,
            routes,
        }
    }

    /// Generate a complete itinerary for the request
    pub async fn generate(&self, request: &ScheduleCreateRequest) -> Result<Itinerary> {
        validate_dates(request)?;

        let draft_days = self
            .draft(request)
            .await
            .map_err(|e| TripCraftError::generation("draft", e))?;
        info!(
            "Drafted {} days for {}",
            draft_days.len(),
            request.destination.display_name()
        );

        let days = self
            .resolve(&draft_days)
            .await
            .map_err(|e| TripCraftError::generation("resolve", e))?;

        let days = self
            .time(days)
            .await
            .map_err(|e| TripCraftError::generation("time", e))?;

        let days = self
            .cost(days)
            .await
            .map_err(|e| TripCraftError::generation("cost", e))?;

        let itinerary = assemble(request, days);
        info!("Assembled itinerary '{}'", itinerary.title);
        Ok(itinerary)
    }

    /// Draft the itinerary skeleton: ordered dates, each with ordered draft
    /// places
    async fn draft(
        &self,
        request: &ScheduleCreateRequest,
    ) -> Result<Vec<(String, Vec<DraftPlace>)>> {
        let prompt = prompts::build_create_prompt(request);
        let document = self.generator.generate_document(&prompt).await?;
        parse_draft(&document)
    }

    /// Resolve each draft place to coordinates and an address, preserving
    /// per-day order and the overall date order
    async fn resolve(
        &self,
        draft_days: &[(String, Vec<DraftPlace>)],
    ) -> Result<Vec<(String, Vec<Stop>)>> {
        let mut days = Vec::with_capacity(draft_days.len());
        for (date, drafts) in draft_days {
            let mut stops = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let category = CategoryGroup::from_label(&draft.category);
                let stop = match self
                    .places
                    .resolve_generated(&draft.name, None, category)
                    .await?
                {
                    Some(place) => {
                        debug!("Resolved '{}' to '{}'", draft.name, place.name);
                        Stop::resolved(place, draft.category.clone())
                    }
                    None => {
                        warn!("No place found for '{}', keeping it unlocated", draft.name);
                        Stop::unlocated(draft.name.clone(), draft.category.clone())
                    }
                };
                stops.push(stop);
            }
            days.push((date.clone(), stops));
        }
        Ok(days)
    }

    /// Attach walk/drive/transit durations to each stop that has a located
    /// predecessor within the same day
    async fn time(&self, mut days: Vec<(String, Vec<Stop>)>) -> Result<Vec<(String, Vec<Stop>)>> {
        for (_, stops) in &mut days {
            for i in 1..stops.len() {
                if !stops[i - 1].has_coordinates() || !stops[i].has_coordinates() {
                    continue;
                }
                let (from_lat, from_lng) = (stops[i - 1].latitude, stops[i - 1].longitude);
                let (to_lat, to_lng) = (stops[i].latitude, stops[i].longitude);
                stops[i].travel =
                    measure_leg(&self.routes, from_lat, from_lng, to_lat, to_lng).await?;
            }
        }
        Ok(days)
    }

    /// Ask the generator for per-place cost estimates and merge them back
    /// into the stops by normalized name
    async fn cost(&self, days: Vec<(String, Vec<Stop>)>) -> Result<Vec<(String, Vec<Stop>)>> {
        let prompt = prompts::build_cost_prompt(&days);
        let document = self.generator.generate_document(&prompt).await?;
        apply_costs(days, &document)
    }
}

/// Reject requests that start in the past or end before they start
fn validate_dates(request: &ScheduleCreateRequest) -> Result<()> {
    let today = Local::now().date_naive();
    if request.start_date < today {
        return Err(TripCraftError::invalid_date(format!(
            "start date {} is in the past",
            request.start_date
        )));
    }
    if request.end_date < request.start_date {
        return Err(TripCraftError::invalid_date(format!(
            "end date {} is before start date {}",
            request.end_date, request.start_date
        )));
    }
    Ok(())
}

/// Parse the draft document's `itinerary` array into ordered
/// `(date, draft places)` pairs
fn parse_draft(document: &Value) -> Result<Vec<(String, Vec<DraftPlace>)>> {
    let itinerary = document
        .get("itinerary")
        .and_then(Value::as_array)
        .ok_or_else(|| TripCraftError::malformed_response("draft has no itinerary array"))?;

    let mut days = Vec::with_capacity(itinerary.len());
    for entry in itinerary {
        let date = entry
            .get("date")
            .and_then(Value::as_str)
            .ok_or_else(|| TripCraftError::malformed_response("draft day has no date"))?;
        let schedule = entry
            .get("travelSchedule")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                TripCraftError::malformed_response(format!(
                    "draft day {date} has no travelSchedule array"
                ))
            })?;

        let mut drafts = Vec::with_capacity(schedule.len());
        for place in schedule {
            let name = place.get("name").and_then(Value::as_str).ok_or_else(|| {
                TripCraftError::malformed_response(format!("draft place in {date} has no name"))
            })?;
            let category = place.get("type").and_then(Value::as_str).unwrap_or_default();
            drafts.push(DraftPlace {
                name: name.to_string(),
                category: category.to_string(),
            });
        }
        days.push((date.to_string(), drafts));
    }
    Ok(days)
}

/// Merge the cost document into the day list, matching entries to stops by
/// normalized name; unmatched entries are ignored and unmatched stops keep
/// their zero cost. Consumes the day list and returns a rebuilt one.
fn apply_costs(
    days: Vec<(String, Vec<Stop>)>,
    document: &Value,
) -> Result<Vec<(String, Vec<Stop>)>> {
    let by_date = document
        .as_object()
        .ok_or_else(|| TripCraftError::malformed_response("cost document is not keyed by date"))?;

    Ok(days
        .into_iter()
        .map(|(date, stops)| {
            let entries = by_date
                .get(&date)
                .filter(|_| date != TOTAL_COST_KEY)
                .and_then(|block| block.get("travelSchedule"))
                .and_then(Value::as_array);
            let stops = match entries {
                Some(entries) => merge_day_costs(stops, entries),
                None => stops,
            };
            (date, stops)
        })
        .collect())
}

/// Rebuild one day's stops with the generator's cost entries; each entry
/// sets the cost of the first stop whose normalized name equals its own
fn merge_day_costs(stops: Vec<Stop>, entries: &[Value]) -> Vec<Stop> {
    let mut costs: Vec<Option<i64>> = vec![None; stops.len()];
    for entry in entries {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            continue;
        };
        let wanted = normalize_name(name);
        if let Some(pos) = stops
            .iter()
            .position(|stop| normalize_name(&stop.name) == wanted)
        {
            costs[pos] = Some(entry.get("estimatedCost").and_then(Value::as_i64).unwrap_or(0));
        }
    }
    stops
        .into_iter()
        .zip(costs)
        .map(|(stop, cost)| match cost {
            Some(estimated_cost) => Stop {
                estimated_cost,
                ..stop
            },
            None => stop,
        })
        .collect()
}

/// Cost entries match stops by name with whitespace stripped and case folded
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Emit day blocks in draft date order with 1-based labels, per-day cost
/// totals, and the derived title
fn assemble(request: &ScheduleCreateRequest, days: Vec<(String, Vec<Stop>)>) -> Itinerary {
    let day_blocks = days
        .into_iter()
        .enumerate()
        .map(|(index, (date, stops))| DayBlock {
            day: format!("{}일차", index + 1),
            date,
            total_estimated_cost: stops.iter().map(|stop| stop.estimated_cost).sum(),
            stops,
        })
        .collect();

    let nights = (request.end_date - request.start_date).num_days();
    Itinerary {
        title: format!(
            "{} {}박 {}일 여행",
            request.destination.display_name(),
            nights,
            nights + 1
        ),
        start_date: request.start_date,
        end_date: request.end_date,
        days: day_blocks,
    }
}
