use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use fairway_core::GolferId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_golfer).get(list_golfers))
        .route(
            "/:id",
            get(get_golfer).put(update_golfer).delete(remove_golfer),
        )
}

pub async fn register_golfer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::GolferRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.directory.register(body.into(), Utc::now()).await {
        Ok(golfer) => (StatusCode::CREATED, Json(dto::golfer_to_json(&golfer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_golfers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.directory.list().await {
        Ok(golfers) => {
            let items = golfers.iter().map(dto::golfer_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_golfer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let golfer_id: GolferId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.directory.get(golfer_id).await {
        Ok(golfer) => (StatusCode::OK, Json(dto::golfer_to_json(&golfer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_golfer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::GolferRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let golfer_id: GolferId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .directory
        .update(golfer_id, body.into(), Utc::now())
        .await
    {
        Ok(golfer) => (StatusCode::OK, Json(dto::golfer_to_json(&golfer))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Removes the golfer and their bookings.
pub async fn remove_golfer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let golfer_id: GolferId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.directory.remove(golfer_id, Utc::now()).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
