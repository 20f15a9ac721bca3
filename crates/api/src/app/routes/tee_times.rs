use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use fairway_core::TeeTimeId;
use fairway_infra::TeeTimeOrder;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tee_times).post(schedule_tee_time))
        .route(
            "/:id",
            get(get_tee_time)
                .put(reschedule_tee_time)
                .delete(remove_tee_time),
        )
}

pub async fn list_tee_times(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListTeeTimesQuery>,
) -> axum::response::Response {
    let order = match query.ordering.as_deref() {
        Some(raw) => match raw.parse::<TeeTimeOrder>() {
            Ok(order) => order,
            Err(e) => return errors::service_error_to_response(e),
        },
        None => TeeTimeOrder::default(),
    };

    match services.ledger.list_tee_times(order).await {
        Ok(tee_times) => {
            let items = tee_times.iter().map(dto::tee_time_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn schedule_tee_time(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ScheduleTeeTimeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let capacity = match dto::capacity(body.capacity) {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(e),
    };

    match services
        .tee_sheet
        .schedule(body.start_time, body.course_section, capacity, Utc::now())
        .await
    {
        Ok(tee_time) => (StatusCode::CREATED, Json(dto::tee_time_to_json(&tee_time))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_tee_time(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let tee_time_id: TeeTimeId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.get_tee_time(tee_time_id).await {
        Ok(tee_time) => (StatusCode::OK, Json(dto::tee_time_to_json(&tee_time))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reschedule_tee_time(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::RescheduleTeeTimeRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let tee_time_id: TeeTimeId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let capacity = match dto::capacity(body.capacity) {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(e),
    };

    match services
        .tee_sheet
        .reschedule(
            tee_time_id,
            body.start_time,
            body.course_section,
            capacity,
            Utc::now(),
        )
        .await
    {
        Ok(tee_time) => (StatusCode::OK, Json(dto::tee_time_to_json(&tee_time))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Removes the tee time and its bookings.
pub async fn remove_tee_time(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let tee_time_id: TeeTimeId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.tee_sheet.remove(tee_time_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
