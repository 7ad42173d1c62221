//! Pipeline tests with mocked collaborators
//!
//! The generation, edit, and detail pipelines are exercised end to end with
//! in-memory implementations of the text-generation, place-search, and
//! route-timing collaborators. The mocks share their state through `Arc` so
//! tests can assert on call counts after a pipeline has consumed them.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Local};
use serde_json::json;

use tripcraft::models::NO_ADDRESS;
use tripcraft::{
    CategoryGroup, City, LegTimes, PlaceDetailRequest, PlaceDetailService, PlaceProvider,
    ResolvedPlace, Result, RouteTimeProvider, ScheduleCreateRequest, ScheduleCreateService,
    ScheduleEditService, TextGenerator, TravelMode, TripCraftError,
};

/// Route tracing output through the test harness; failing tests then show
/// the pipeline's progress and fallback logs
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Generator that replays a scripted queue of responses
#[derive(Clone, Default)]
struct ScriptedGenerator {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TripCraftError::malformed_response("no scripted response left"))
            })
    }
}

/// Place provider backed by a fixed keyword → place map
#[derive(Clone, Default)]
struct StaticPlaces {
    by_keyword: Arc<HashMap<String, ResolvedPlace>>,
    search_calls: Arc<AtomicUsize>,
}

impl StaticPlaces {
    fn with(entries: Vec<(&str, ResolvedPlace)>) -> Self {
        Self {
            by_keyword: Arc::new(
                entries
                    .into_iter()
                    .map(|(keyword, place)| (keyword.to_string(), place))
                    .collect(),
            ),
            search_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

impl PlaceProvider for StaticPlaces {
    async fn resolve_city(&self, lat: f64, lng: f64) -> Result<City> {
        Err(TripCraftError::CityNotFound { lat, lng })
    }

    async fn search(
        &self,
        keyword: &str,
        _category: Option<CategoryGroup>,
    ) -> Result<Option<ResolvedPlace>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.by_keyword.get(keyword).cloned())
    }

    async fn search_near(
        &self,
        keyword: &str,
        _lat: f64,
        _lng: f64,
        _radius_m: u32,
    ) -> Result<Option<ResolvedPlace>> {
        Ok(self.by_keyword.get(keyword).cloned())
    }

    async fn search_top_by_category(
        &self,
        _lat: f64,
        _lng: f64,
        _category: CategoryGroup,
        _limit: usize,
    ) -> Result<Vec<ResolvedPlace>> {
        Ok(Vec::new())
    }

    async fn search_many_by_category(
        &self,
        _lat: f64,
        _lng: f64,
        _category: CategoryGroup,
    ) -> Result<Vec<ResolvedPlace>> {
        Ok(Vec::new())
    }
}

/// Route provider with fixed per-mode durations, or one that always fails
#[derive(Clone)]
struct FixedRoutes {
    minutes: Option<(u32, u32, u32)>,
    calls: Arc<AtomicUsize>,
}

impl FixedRoutes {
    fn fixed(walk: u32, drive: u32, transit: u32) -> Self {
        Self {
            minutes: Some((walk, drive, transit)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing() -> Self {
        Self {
            minutes: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteTimeProvider for FixedRoutes {
    async fn travel_minutes(
        &self,
        mode: TravelMode,
        _from_lat: f64,
        _from_lng: f64,
        _to_lat: f64,
        _to_lng: f64,
    ) -> Result<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((walk, drive, transit)) = self.minutes else {
            return Err(TripCraftError::upstream(Some(500), "route service down"));
        };
        Ok(match mode {
            TravelMode::Walk => walk,
            TravelMode::Drive => drive,
            TravelMode::Transit => transit,
        })
    }
}

fn place(name: &str, lat: f64, lng: f64) -> ResolvedPlace {
    ResolvedPlace {
        name: name.to_string(),
        latitude: lat,
        longitude: lng,
        address: format!("{name} 앞길 1"),
        phone: String::new(),
        category_code: String::new(),
    }
}

fn create_request() -> ScheduleCreateRequest {
    let start = Local::now().date_naive() + Duration::days(30);
    ScheduleCreateRequest {
        destination: City::Jeju,
        start_date: start,
        end_date: start + Duration::days(1),
        preferences: None,
    }
}

#[tokio::test]
async fn invalid_start_date_fails_before_any_external_call() {
    init_tracing();
    let generator = ScriptedGenerator::new(vec![]);
    let places = StaticPlaces::default();
    let routes = FixedRoutes::fixed(1, 1, 1);
    let service = ScheduleCreateService::new(generator.clone(), places.clone(), routes.clone());

    let mut request = create_request();
    request.start_date = Local::now().date_naive() - Duration::days(1);

    let err = service.generate(&request).await.unwrap_err();
    assert!(matches!(err, TripCraftError::InvalidDate { .. }));
    assert_eq!(generator.calls(), 0);
    assert_eq!(places.search_calls(), 0);
    assert_eq!(routes.calls(), 0);
}

#[tokio::test]
async fn two_day_itinerary_keeps_date_order_and_merges_costs() {
    init_tracing();
    let draft = json!({
        "itinerary": [
            {"date": "2025-06-01", "travelSchedule": [{"name": "경복궁", "type": "관광지"}]},
            {"date": "2025-06-02", "travelSchedule": [{"name": "광장시장", "type": "식사"}]},
        ]
    });
    let costs = json!({
        "2025-06-01": {"travelSchedule": [{"name": "경복궁", "estimatedCost": 1000}]},
        "2025-06-02": {"travelSchedule": [{"name": "광장시장", "estimatedCost": 2000}]},
        "totalEstimatedCost": 3000,
    });
    let generator = ScriptedGenerator::new(vec![Ok(draft.to_string()), Ok(costs.to_string())]);
    let places = StaticPlaces::with(vec![
        ("경복궁", place("경복궁", 37.5796, 126.977)),
        ("광장시장", place("광장시장", 37.5701, 126.9996)),
    ]);
    let service = ScheduleCreateService::new(generator, places, FixedRoutes::fixed(5, 2, 9));

    let itinerary = service.generate(&create_request()).await.unwrap();

    assert_eq!(itinerary.title, "제주 1박 2일 여행");
    assert_eq!(itinerary.days.len(), 2);
    assert_eq!(itinerary.days[0].date, "2025-06-01");
    assert_eq!(itinerary.days[0].day, "1일차");
    assert_eq!(itinerary.days[0].total_estimated_cost, 1000);
    assert_eq!(itinerary.days[1].date, "2025-06-02");
    assert_eq!(itinerary.days[1].day, "2일차");
    assert_eq!(itinerary.days[1].total_estimated_cost, 2000);
    assert_eq!(itinerary.days[0].stops[0].estimated_cost, 1000);
    assert_eq!(itinerary.days[0].stops[0].address, "경복궁 앞길 1");
}

#[tokio::test]
async fn day_order_follows_draft_even_when_unsorted() {
    init_tracing();
    let draft = json!({
        "itinerary": [
            {"date": "2025-06-02", "travelSchedule": [{"name": "광장시장", "type": "식사"}]},
            {"date": "2025-06-01", "travelSchedule": [{"name": "경복궁", "type": "관광지"}]},
        ]
    });
    let generator = ScriptedGenerator::new(vec![Ok(draft.to_string()), Ok(json!({}).to_string())]);
    let places = StaticPlaces::with(vec![
        ("경복궁", place("경복궁", 37.5796, 126.977)),
        ("광장시장", place("광장시장", 37.5701, 126.9996)),
    ]);
    let service = ScheduleCreateService::new(generator, places, FixedRoutes::fixed(1, 1, 1));

    let itinerary = service.generate(&create_request()).await.unwrap();
    assert_eq!(itinerary.days[0].date, "2025-06-02");
    assert_eq!(itinerary.days[1].date, "2025-06-01");
}

#[tokio::test]
async fn cost_merge_ignores_whitespace_and_case() {
    init_tracing();
    let draft = json!({
        "itinerary": [
            {"date": "2025-06-01", "travelSchedule": [
                {"name": "Gyeongbokgung Palace", "type": "관광지"},
            ]},
        ]
    });
    let costs = json!({
        "2025-06-01": {"travelSchedule": [
            {"name": "gyeongbokgungpalace", "estimatedCost": 12000},
        ]},
    });
    let generator = ScriptedGenerator::new(vec![Ok(draft.to_string()), Ok(costs.to_string())]);
    let places = StaticPlaces::with(vec![(
        "Gyeongbokgung Palace",
        place("Gyeongbokgung Palace", 37.5796, 126.977),
    )]);
    let service = ScheduleCreateService::new(generator, places, FixedRoutes::fixed(1, 1, 1));

    let itinerary = service.generate(&create_request()).await.unwrap();
    assert_eq!(itinerary.days[0].stops[0].estimated_cost, 12000);
    assert_eq!(itinerary.days[0].total_estimated_cost, 12000);
}

#[tokio::test]
async fn timing_attaches_to_the_later_stop() {
    init_tracing();
    let draft = json!({
        "itinerary": [
            {"date": "2025-06-01", "travelSchedule": [
                {"name": "경복궁", "type": "관광지"},
                {"name": "광장시장", "type": "식사"},
            ]},
        ]
    });
    let generator = ScriptedGenerator::new(vec![Ok(draft.to_string()), Ok(json!({}).to_string())]);
    let places = StaticPlaces::with(vec![
        ("경복궁", place("경복궁", 37.5796, 126.977)),
        ("광장시장", place("광장시장", 37.5701, 126.9996)),
    ]);
    let routes = FixedRoutes::fixed(7, 3, 12);
    let service = ScheduleCreateService::new(generator, places, routes.clone());

    let itinerary = service.generate(&create_request()).await.unwrap();
    let stops = &itinerary.days[0].stops;
    assert_eq!(stops[0].travel, LegTimes::Unset);
    assert_eq!(
        stops[1].travel,
        LegTimes::Measured {
            walk_min: 7,
            drive_min: 3,
            transit_min: 12,
        }
    );
    assert_eq!(routes.calls(), 3);
}

#[tokio::test]
async fn unresolved_draft_place_stays_unlocated_and_untimed() {
    init_tracing();
    let draft = json!({
        "itinerary": [
            {"date": "2025-06-01", "travelSchedule": [
                {"name": "경복궁", "type": "관광지"},
                {"name": "존재하지 않는 식당", "type": "식사"},
            ]},
        ]
    });
    let generator = ScriptedGenerator::new(vec![Ok(draft.to_string()), Ok(json!({}).to_string())]);
    let places = StaticPlaces::with(vec![("경복궁", place("경복궁", 37.5796, 126.977))]);
    let routes = FixedRoutes::fixed(1, 1, 1);
    let service = ScheduleCreateService::new(generator, places, routes.clone());

    let itinerary = service.generate(&create_request()).await.unwrap();
    let stops = &itinerary.days[0].stops;
    assert_eq!(stops[1].name, "존재하지 않는 식당");
    assert_eq!(stops[1].address, NO_ADDRESS);
    assert_eq!(stops[1].travel, LegTimes::Unset);
    assert_eq!(routes.calls(), 0);
}

#[tokio::test]
async fn route_failure_aborts_the_generation_pipeline() {
    init_tracing();
    let draft = json!({
        "itinerary": [
            {"date": "2025-06-01", "travelSchedule": [
                {"name": "경복궁", "type": "관광지"},
                {"name": "광장시장", "type": "식사"},
            ]},
        ]
    });
    let generator = ScriptedGenerator::new(vec![Ok(draft.to_string())]);
    let places = StaticPlaces::with(vec![
        ("경복궁", place("경복궁", 37.5796, 126.977)),
        ("광장시장", place("광장시장", 37.5701, 126.9996)),
    ]);
    let service = ScheduleCreateService::new(generator, places, FixedRoutes::failing());

    let err = service.generate(&create_request()).await.unwrap_err();
    let TripCraftError::Generation { stage, source } = err else {
        panic!("expected a stage-tagged failure");
    };
    assert_eq!(stage, "time");
    assert!(matches!(*source, TripCraftError::Upstream { .. }));
}

#[tokio::test]
async fn safety_block_surfaces_as_draft_stage_failure() {
    init_tracing();
    let generator =
        ScriptedGenerator::new(vec![Err(TripCraftError::safety_blocked("SAFETY"))]);
    let service = ScheduleCreateService::new(
        generator,
        StaticPlaces::default(),
        FixedRoutes::fixed(1, 1, 1),
    );

    let err = service.generate(&create_request()).await.unwrap_err();
    let TripCraftError::Generation { stage, source } = err else {
        panic!("expected a stage-tagged failure");
    };
    assert_eq!(stage, "draft");
    assert!(matches!(*source, TripCraftError::SafetyBlocked { .. }));
}

#[tokio::test]
async fn edit_accepts_bare_array_and_sums_costs() {
    init_tracing();
    let response = json!([
        {"name": "경복궁", "type": "관광지", "hashtag": "#궁궐", "estimatedCost": 3000},
        {"name": "광장시장", "type": "식사", "estimatedCost": 8000},
    ]);
    let generator = ScriptedGenerator::new(vec![Ok(response.to_string())]);
    let places = StaticPlaces::with(vec![
        ("경복궁", place("경복궁", 37.5796, 126.977)),
        ("광장시장", place("광장시장", 37.5701, 126.9996)),
    ]);
    let service = ScheduleEditService::new(generator, places, FixedRoutes::fixed(10, 4, 15));

    let result = service
        .edit(&["경복궁".to_string(), "광장시장".to_string()])
        .await
        .unwrap();

    assert_eq!(result.places.len(), 2);
    assert_eq!(result.total_estimated_cost, 11000);
    assert_eq!(result.places[0].hashtag.as_deref(), Some("#궁궐"));
    assert_eq!(result.places[0].travel, LegTimes::Unset);
    assert_eq!(
        result.places[1].travel,
        LegTimes::Measured {
            walk_min: 10,
            drive_min: 4,
            transit_min: 15,
        }
    );
}

#[tokio::test]
async fn edit_accepts_places_object_shape() {
    init_tracing();
    let response = json!({"places": [{"name": "경복궁", "type": "관광지", "estimatedCost": 500}]});
    let generator = ScriptedGenerator::new(vec![Ok(response.to_string())]);
    let places = StaticPlaces::with(vec![("경복궁", place("경복궁", 37.5796, 126.977))]);
    let service = ScheduleEditService::new(generator, places, FixedRoutes::fixed(1, 1, 1));

    let result = service.edit(&["경복궁".to_string()]).await.unwrap();
    assert_eq!(result.places.len(), 1);
    assert_eq!(result.total_estimated_cost, 500);
}

#[tokio::test]
async fn edit_rejects_unexpected_payload_shape() {
    init_tracing();
    let generator = ScriptedGenerator::new(vec![Ok(json!({"items": []}).to_string())]);
    let service = ScheduleEditService::new(
        generator,
        StaticPlaces::default(),
        FixedRoutes::fixed(1, 1, 1),
    );

    let err = service.edit(&["경복궁".to_string()]).await.unwrap_err();
    assert!(matches!(err, TripCraftError::InvalidEditResponse { .. }));
}

#[tokio::test]
async fn edit_drops_blank_unresolved_and_unrelated_entries() {
    init_tracing();
    let response = json!([
        {"name": "  ", "type": "관광지"},
        {"name": "미지의 장소", "type": "관광지"},
        {"name": "한라산", "type": "관광지", "estimatedCost": 2000},
        {"name": "경복궁", "type": "관광지", "estimatedCost": 3000},
    ]);
    let generator = ScriptedGenerator::new(vec![Ok(response.to_string())]);
    // "한라산" resolves to something entirely unrelated and must be dropped
    let places = StaticPlaces::with(vec![
        ("한라산", place("설악산 케이블카", 38.1196, 128.4656)),
        ("경복궁", place("경복궁", 37.5796, 126.977)),
    ]);
    let service = ScheduleEditService::new(generator, places, FixedRoutes::fixed(1, 1, 1));

    let result = service
        .edit(&["한라산".to_string(), "경복궁".to_string()])
        .await
        .unwrap();

    assert_eq!(result.places.len(), 1);
    assert_eq!(result.places[0].name, "경복궁");
    assert_eq!(result.total_estimated_cost, 3000);
}

#[tokio::test]
async fn edit_keeps_requested_name_over_resolved_name() {
    init_tracing();
    let response = json!([{"name": "경복궁", "type": "관광지"}]);
    let generator = ScriptedGenerator::new(vec![Ok(response.to_string())]);
    let places = StaticPlaces::with(vec![("경복궁", place("경복궁 고궁", 37.5796, 126.977))]);
    let service = ScheduleEditService::new(generator, places, FixedRoutes::fixed(1, 1, 1));

    let result = service.edit(&["경복궁".to_string()]).await.unwrap();
    assert_eq!(result.places[0].name, "경복궁");
    assert_eq!(result.places[0].address, "경복궁 고궁 앞길 1");
}

#[tokio::test]
async fn edit_skips_timing_around_zero_coordinates() {
    init_tracing();
    let response = json!([
        {"name": "경복궁", "type": "관광지"},
        {"name": "좌표없는곳", "type": "관광지"},
        {"name": "광장시장", "type": "식사"},
    ]);
    let generator = ScriptedGenerator::new(vec![Ok(response.to_string())]);
    let places = StaticPlaces::with(vec![
        ("경복궁", place("경복궁", 37.5796, 126.977)),
        ("좌표없는곳", place("좌표없는곳", 0.0, 0.0)),
        ("광장시장", place("광장시장", 37.5701, 126.9996)),
    ]);
    let routes = FixedRoutes::fixed(1, 1, 1);
    let service = ScheduleEditService::new(generator, places, routes.clone());

    let result = service
        .edit(&[
            "경복궁".to_string(),
            "좌표없는곳".to_string(),
            "광장시장".to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(result.places.len(), 3);
    // Timing must stay unset around the unresolved sentinel, not failed
    assert_eq!(result.places[1].travel, LegTimes::Unset);
    assert_eq!(result.places[2].travel, LegTimes::Unset);
    assert_eq!(routes.calls(), 0);
}

#[tokio::test]
async fn edit_route_failure_marks_leg_failed_but_keeps_the_list() {
    init_tracing();
    let response = json!([
        {"name": "경복궁", "type": "관광지", "estimatedCost": 1000},
        {"name": "광장시장", "type": "식사", "estimatedCost": 2000},
    ]);
    let generator = ScriptedGenerator::new(vec![Ok(response.to_string())]);
    let places = StaticPlaces::with(vec![
        ("경복궁", place("경복궁", 37.5796, 126.977)),
        ("광장시장", place("광장시장", 37.5701, 126.9996)),
    ]);
    let service = ScheduleEditService::new(generator, places, FixedRoutes::failing());

    let result = service
        .edit(&["경복궁".to_string(), "광장시장".to_string()])
        .await
        .unwrap();

    assert_eq!(result.places.len(), 2);
    assert_eq!(result.places[1].travel, LegTimes::Failed);
    assert_eq!(result.places[1].travel.walk_minutes(), Some(-1));
    assert_eq!(result.places[1].travel.drive_minutes(), Some(-1));
    assert_eq!(result.places[1].travel.transit_minutes(), Some(-1));
    assert_eq!(result.total_estimated_cost, 3000);
}

#[tokio::test]
async fn detail_combines_description_and_nearby_location() {
    init_tracing();
    let generator = ScriptedGenerator::new(vec![Ok(
        json!({"description": "야경이 아름다운 조선의 법궁"}).to_string(),
    )]);
    let places = StaticPlaces::with(vec![("경복궁", place("경복궁", 37.5796, 126.977))]);
    let service = PlaceDetailService::new(generator, places);

    let detail = service
        .detail(&PlaceDetailRequest {
            name: "경복궁".to_string(),
            category: "관광지".to_string(),
            estimated_cost: 3000,
            latitude: 37.58,
            longitude: 126.98,
        })
        .await
        .unwrap();

    assert_eq!(detail.name, "경복궁");
    assert_eq!(detail.description, "야경이 아름다운 조선의 법궁");
    assert_eq!(detail.address, "경복궁 앞길 1");
    assert!((detail.latitude - 37.5796).abs() < 1e-9);
    assert_eq!(detail.estimated_cost, 3000);
}

#[tokio::test]
async fn detail_without_nearby_match_keeps_empty_location() {
    init_tracing();
    let generator =
        ScriptedGenerator::new(vec![Ok(json!({"description": "소개"}).to_string())]);
    let service = PlaceDetailService::new(generator, StaticPlaces::default());

    let detail = service
        .detail(&PlaceDetailRequest {
            name: "어딘가".to_string(),
            category: "관광지".to_string(),
            estimated_cost: 0,
            latitude: 37.58,
            longitude: 126.98,
        })
        .await
        .unwrap();

    assert_eq!(detail.address, "");
    assert_eq!(detail.latitude, 0.0);
    assert_eq!(detail.longitude, 0.0);
}
