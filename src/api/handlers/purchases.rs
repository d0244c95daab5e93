//! Purchase endpoints.
//!
//! `POST /api/purchases` is called by the checkout flow after the payment gateway
//! confirms a charge. The sales listing and deletes are admin-only.

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::auth::require_admin;
use super::{ErrorResponse, MessageResponse, error_response, message_response};
use crate::magic_link::MagicLinkService;
use crate::purchases::{
    CreateOutcome, CreatePurchaseRequest, Purchase, PurchaseWithContainer, repo,
};

#[utoipa::path(
    post,
    path = "/api/purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 200, description = "Purchase recorded; container marked unavailable", body = Purchase),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 404, description = "Unknown container", body = ErrorResponse),
        (status = 500, description = "Purchase could not be stored", body = ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    pool: Extension<PgPool>,
    payload: Result<Json<CreatePurchaseRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected purchase payload: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
        }
    };

    let purchase = match request.validate() {
        Ok(purchase) => purchase,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.message()),
    };

    match repo::create_purchase(&pool, &purchase).await {
        Ok(CreateOutcome::Created(created)) => {
            info!(purchase_id = %created.id, container_id = %created.container_id, "purchase recorded");
            (StatusCode::OK, Json(created)).into_response()
        }
        Ok(CreateOutcome::ContainerNotFound) => {
            error_response(StatusCode::NOT_FOUND, "Container not found")
        }
        Err(err) => {
            error!("Failed to create purchase: {err:#}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create purchase",
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/purchases",
    responses(
        (status = 200, description = "Sales, newest first", body = [PurchaseWithContainer]),
        (status = 401, description = "Admin session required", body = ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn list_purchases(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    service: Extension<Arc<MagicLinkService>>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &service).await {
        return response;
    }

    match repo::list_purchases(&pool).await {
        Ok(purchases) => (StatusCode::OK, Json(purchases)).into_response(),
        Err(err) => {
            error!("Failed to list purchases: {err:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/purchases/{id}",
    params(("id" = String, Path, description = "Purchase id")),
    responses(
        (status = 200, description = "Purchase deleted", body = MessageResponse),
        (status = 401, description = "Admin session required", body = ErrorResponse),
        (status = 404, description = "Unknown purchase", body = ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn delete_purchase(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    service: Extension<Arc<MagicLinkService>>,
) -> impl IntoResponse {
    let admin = match require_admin(&headers, &service).await {
        Ok(admin) => admin,
        Err(response) => return response,
    };
    let Ok(id) = Uuid::parse_str(id.trim()) else {
        return error_response(StatusCode::NOT_FOUND, "Purchase not found");
    };

    match repo::delete_purchase(&pool, id).await {
        Ok(true) => {
            info!(purchase_id = %id, admin = %admin.email, "purchase deleted");
            message_response(StatusCode::OK, "Purchase deleted successfully")
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Purchase not found"),
        Err(err) => {
            error!("Failed to delete purchase: {err:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
