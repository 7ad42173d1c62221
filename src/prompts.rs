//! Prompt builders for the generation, cost, edit, and description calls
//!
//! These are opaque string producers: the pipelines only rely on the JSON
//! shape the model is asked to return, never on the wording.

use serde_json::json;

use crate::models::{ScheduleCreateRequest, Stop};

/// Prompt asking the model to draft a day-by-day itinerary skeleton
#[must_use]
pub fn build_create_prompt(request: &ScheduleCreateRequest) -> String {
    let preferences = request.preferences.as_deref().unwrap_or("없음");
    format!(
        "당신은 국내 여행 일정 플래너입니다. {destination} 지역에서 {start}부터 {end}까지의 여행 일정을 만들어 주세요.\n\
         여행 취향: {preferences}\n\
         하루에 4~6곳을 방문하고, 각 장소의 type은 관광지/식사/카페/숙소/문화시설 중 하나여야 합니다.\n\
         장소 이름은 실제로 존재하는 명소나 상호 이름으로 작성하세요.\n\
         아래 JSON 형식으로만 응답하세요:\n\
         {{\"itinerary\": [{{\"date\": \"YYYY-MM-DD\", \"travelSchedule\": [{{\"name\": \"장소명\", \"type\": \"관광지\"}}]}}]}}",
        destination = request.destination.display_name(),
        start = request.start_date,
        end = request.end_date,
    )
}

/// Prompt asking the model to estimate per-place costs for resolved days
#[must_use]
pub fn build_cost_prompt(days: &[(String, Vec<Stop>)]) -> String {
    let context: serde_json::Map<String, serde_json::Value> = days
        .iter()
        .map(|(date, stops)| {
            let schedule: Vec<_> = stops
                .iter()
                .map(|stop| {
                    json!({
                        "name": stop.name,
                        "type": stop.category,
                        "lat": stop.latitude,
                        "lng": stop.longitude,
                    })
                })
                .collect();
            (date.clone(), json!({ "travelSchedule": schedule }))
        })
        .collect();

    format!(
        "다음은 날짜별 여행 일정입니다:\n{context}\n\
         각 장소의 1인 기준 예상 비용(원)을 추정해 주세요. 장소 이름은 입력 그대로 사용하세요.\n\
         아래 JSON 형식으로만 응답하세요:\n\
         {{\"YYYY-MM-DD\": {{\"travelSchedule\": [{{\"name\": \"장소명\", \"estimatedCost\": 10000}}]}}, \"totalEstimatedCost\": 0}}",
        context = serde_json::Value::Object(context),
    )
}

/// Prompt asking the model to enrich a free-text place-name list
#[must_use]
pub fn build_edit_prompt(names: &[String]) -> String {
    format!(
        "다음 장소 이름 목록을 여행 일정 항목으로 정리해 주세요.\n\
         장소 목록: {names}\n\
         각 항목에 대표 해시태그, type(관광지/식사/카페/숙소/문화시설), 1인 기준 예상 비용(원)을 채워 주세요.\n\
         아래 JSON 형식으로만 응답하세요:\n\
         {{\"places\": [{{\"name\": \"장소명\", \"hashtag\": \"#해시태그\", \"type\": \"관광지\", \"estimatedCost\": 0}}]}}",
        names = names.join(", "),
    )
}

/// Prompt asking the model for a one-line place description
#[must_use]
pub fn build_description_prompt(name: &str, category: &str) -> String {
    format!(
        "장소 \"{name}\"({category})에 대한 한 줄 소개를 작성해 주세요.\n\
         아래 JSON 형식으로만 응답하세요:\n\
         {{\"description\": \"한 줄 소개\"}}"
    )
}
