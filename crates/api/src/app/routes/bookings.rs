use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use fairway_core::{BookingId, GolferId, TeeTimeId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:id", get(get_booking).delete(cancel_booking))
}

pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateBookingRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let tee_time_id: TeeTimeId = match errors::parse_id(&body.tee_time_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let golfer_id: GolferId = match errors::parse_id(&body.golfer_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .ledger
        .create_booking(tee_time_id, golfer_id, body.number_of_players, Utc::now())
        .await
    {
        Ok(detail) => (StatusCode::CREATED, Json(dto::booking_to_json(&detail))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_bookings(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.list_bookings().await {
        Ok(details) => {
            let items = details.iter().map(dto::booking_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let booking_id: BookingId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.get_booking(booking_id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::booking_to_json(&detail))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Cancelling deletes the booking and returns its slots to the tee time.
pub async fn cancel_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let booking_id: BookingId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.cancel_booking(booking_id, Utc::now()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
