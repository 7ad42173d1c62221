//! Domain models for itinerary planning
//!
//! This module contains the data structures flowing through the pipelines:
//! resolved places, stops with cost and travel timing, day blocks, and the
//! final itinerary, plus the supported-city and category enumerations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel address for places without any usable address information
pub const NO_ADDRESS: &str = "주소 정보 없음";

/// Supported destination cities
///
/// Reverse-geocode matching walks `City::ALL` in declaration order and
/// returns the first city whose display name is contained in the region
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum City {
    Gapyeong,
    Gangneung,
    Gyeongju,
    Damyang,
    Sokcho,
    Suwon,
    Yeosu,
    Jeonju,
    Jeju,
    Chuncheon,
    Tongyeong,
    Pohang,
}

impl City {
    /// All supported cities, in matching order
    pub const ALL: [City; 12] = [
        City::Gapyeong,
        City::Gangneung,
        City::Gyeongju,
        City::Damyang,
        City::Sokcho,
        City::Suwon,
        City::Yeosu,
        City::Jeonju,
        City::Jeju,
        City::Chuncheon,
        City::Tongyeong,
        City::Pohang,
    ];

    /// Korean display name, as used in prompts, titles, and region matching
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            City::Gapyeong => "가평",
            City::Gangneung => "강릉",
            City::Gyeongju => "경주",
            City::Damyang => "담양",
            City::Sokcho => "속초",
            City::Suwon => "수원",
            City::Yeosu => "여수",
            City::Jeonju => "전주",
            City::Jeju => "제주",
            City::Chuncheon => "춘천",
            City::Tongyeong => "통영",
            City::Pohang => "포항",
        }
    }

    /// First city (in declaration order) whose display name appears in the
    /// given region name
    #[must_use]
    pub fn match_region(region: &str) -> Option<City> {
        City::ALL
            .into_iter()
            .find(|city| region.contains(city.display_name()))
    }
}

/// Place-search category filters with their upstream category-group codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryGroup {
    Attraction,
    Restaurant,
    Cafe,
    Lodging,
    Culture,
}

impl CategoryGroup {
    /// Upstream category-group code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            CategoryGroup::Attraction => "AT4",
            CategoryGroup::Restaurant => "FD6",
            CategoryGroup::Cafe => "CE7",
            CategoryGroup::Lodging => "AD5",
            CategoryGroup::Culture => "CT1",
        }
    }

    /// Map a draft category label to a search filter
    #[must_use]
    pub fn from_label(label: &str) -> Option<CategoryGroup> {
        match label.trim() {
            "관광지" => Some(CategoryGroup::Attraction),
            "식사" | "맛집" | "음식점" => Some(CategoryGroup::Restaurant),
            "카페" => Some(CategoryGroup::Cafe),
            "숙소" | "숙박" => Some(CategoryGroup::Lodging),
            "문화시설" => Some(CategoryGroup::Culture),
            _ => None,
        }
    }
}

/// Place record resolved by the place-search service; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Road address preferred, lot address as fallback, else [`NO_ADDRESS`]
    pub address: String,
    pub phone: String,
    pub category_code: String,
}

impl ResolvedPlace {
    /// Whether this place carries usable coordinates; `(0, 0)` marks an
    /// unresolved location
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

/// Travel durations from a stop's predecessor within the same day
///
/// `Unset` (no predecessor, or timing not attempted) is distinct from
/// `Failed` (timing attempted and the routing service failed); the two must
/// never be collapsed into one optional integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegTimes {
    Unset,
    Failed,
    Measured {
        walk_min: u32,
        drive_min: u32,
        transit_min: u32,
    },
}

impl LegTimes {
    /// Walking minutes; `-1` is the wire sentinel for a failed computation
    #[must_use]
    pub fn walk_minutes(&self) -> Option<i64> {
        match self {
            LegTimes::Unset => None,
            LegTimes::Failed => Some(-1),
            LegTimes::Measured { walk_min, .. } => Some(i64::from(*walk_min)),
        }
    }

    /// Driving minutes; `-1` is the wire sentinel for a failed computation
    #[must_use]
    pub fn drive_minutes(&self) -> Option<i64> {
        match self {
            LegTimes::Unset => None,
            LegTimes::Failed => Some(-1),
            LegTimes::Measured { drive_min, .. } => Some(i64::from(*drive_min)),
        }
    }

    /// Transit minutes; `-1` is the wire sentinel for a failed computation
    #[must_use]
    pub fn transit_minutes(&self) -> Option<i64> {
        match self {
            LegTimes::Unset => None,
            LegTimes::Failed => Some(-1),
            LegTimes::Measured { transit_min, .. } => Some(i64::from(*transit_min)),
        }
    }
}

/// A resolved place as it appears in a final itinerary: location plus
/// estimated cost and timing from its predecessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    /// Category label as emitted by the generator, e.g. "관광지"
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub phone: String,
    /// Estimated cost per person in KRW
    pub estimated_cost: i64,
    pub travel: LegTimes,
    pub hashtag: Option<String>,
}

impl Stop {
    /// Stop backed by a resolved place; cost and timing are filled later
    #[must_use]
    pub fn resolved(place: ResolvedPlace, category: String) -> Self {
        Self {
            name: place.name,
            category,
            latitude: place.latitude,
            longitude: place.longitude,
            address: place.address,
            phone: place.phone,
            estimated_cost: 0,
            travel: LegTimes::Unset,
            hashtag: None,
        }
    }

    /// Stop for a draft place that could not be resolved; keeps the draft
    /// name with sentinel coordinates and address
    #[must_use]
    pub fn unlocated(name: String, category: String) -> Self {
        Self {
            name,
            category,
            latitude: 0.0,
            longitude: 0.0,
            address: NO_ADDRESS.to_string(),
            phone: String::new(),
            estimated_cost: 0,
            travel: LegTimes::Unset,
            hashtag: None,
        }
    }

    /// Whether this stop carries usable coordinates; `(0, 0)` marks an
    /// unresolved location
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

/// One date's ordered stops; day blocks keep the generator's date order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBlock {
    /// 1-based day label, e.g. "1일차"
    pub day: String,
    /// Date string as emitted by the generator
    pub date: String,
    /// Sum of the constituent stops' estimated costs
    pub total_estimated_cost: i64,
    pub stops: Vec<Stop>,
}

/// A complete generated itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DayBlock>,
}

/// Inbound request for the generation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCreateRequest {
    pub destination: City,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Free-form travel preferences forwarded to the generator
    pub preferences: Option<String>,
}

/// Result of the edit pipeline: accepted stops in order plus their cost sum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditResult {
    pub total_estimated_cost: i64,
    pub places: Vec<Stop>,
}

/// Inbound request for the place-detail service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDetailRequest {
    pub name: String,
    pub category: String,
    pub estimated_cost: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// One place enriched with a one-line description and a located address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetail {
    pub name: String,
    pub category: String,
    pub description: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub estimated_cost: i64,
}
