//! `TripCraft` - AI-assisted multi-day travel itinerary planning
//!
//! This library turns an unstructured model draft into a validated,
//! geolocated, cost-annotated, ordered schedule by combining three external
//! services: a text-generation model, a place-search service, and a
//! route-timing service.

pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod places;
pub mod prompts;
pub mod routing;
pub mod schedule;

// Re-export core types for public API
pub use config::TripCraftConfig;
pub use error::TripCraftError;
pub use gemini::{GeminiClient, TextGenerator, extract_json_block};
pub use models::{
    CategoryGroup, City, DayBlock, EditResult, Itinerary, LegTimes, PlaceDetail,
    PlaceDetailRequest, ResolvedPlace, ScheduleCreateRequest, Stop,
};
pub use places::{KakaoLocalClient, PlaceProvider};
pub use routing::{RouteTimeProvider, TmapRouteClient, TravelMode};
pub use schedule::{PlaceDetailService, ScheduleCreateService, ScheduleEditService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripCraftError>;
