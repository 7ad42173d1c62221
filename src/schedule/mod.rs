//! Itinerary pipelines
//!
//! The generation pipeline turns a request into a complete itinerary
//! (validate → draft → resolve → time → cost → assemble); the edit pipeline
//! rebuilds a stop list from free-text place names; the detail service
//! enriches a single place. Stages run strictly in order with no feedback
//! loops, and all intermediate data is owned per request.

pub mod create;
pub mod detail;
pub mod edit;

pub use create::ScheduleCreateService;
pub use detail::PlaceDetailService;
pub use edit::ScheduleEditService;

use crate::models::LegTimes;
use crate::routing::{RouteTimeProvider, TravelMode};
use crate::Result;

/// Measure walk, drive, and transit durations for one leg, in that order.
/// The first failing call short-circuits the remaining ones.
pub(crate) async fn measure_leg<R: RouteTimeProvider>(
    routes: &R,
    from_lat: f64,
    from_lng: f64,
    to_lat: f64,
    to_lng: f64,
) -> Result<LegTimes> {
    let walk_min = routes
        .travel_minutes(TravelMode::Walk, from_lat, from_lng, to_lat, to_lng)
        .await?;
    let drive_min = routes
        .travel_minutes(TravelMode::Drive, from_lat, from_lng, to_lat, to_lng)
        .await?;
    let transit_min = routes
        .travel_minutes(TravelMode::Transit, from_lat, from_lng, to_lat, to_lng)
        .await?;
    Ok(LegTimes::Measured {
        walk_min,
        drive_min,
        transit_min,
    })
}
