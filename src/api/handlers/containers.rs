//! Container catalog endpoints. Reads are public; writes and search need an admin session.

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info};
use utoipa::IntoParams;
use uuid::Uuid;

use super::auth::require_admin;
use super::{ErrorResponse, MessageResponse, error_response, message_response};
use crate::catalog::{Container, ContainerInput, DeleteOutcome, repo, search};
use crate::magic_link::MagicLinkService;

const NOT_FOUND: &str = "Container not found";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Id, exact price, or text matched against title and size.
    pub q: Option<String>,
}

fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id.trim()).map_err(|_| error_response(StatusCode::NOT_FOUND, NOT_FOUND))
}

fn validated(
    payload: Result<Json<ContainerInput>, JsonRejection>,
) -> Result<crate::catalog::ContainerFields, Response> {
    let Json(input) = payload.map_err(|rejection| {
        debug!("Rejected container payload: {rejection}");
        error_response(StatusCode::BAD_REQUEST, "Invalid container payload")
    })?;
    input
        .validate()
        .map_err(|message| error_response(StatusCode::BAD_REQUEST, &message))
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[utoipa::path(
    get,
    path = "/api/containers",
    responses(
        (status = 200, description = "All containers, newest first", body = [Container]),
        (status = 500, description = "Listing failed", body = ErrorResponse)
    ),
    tag = "containers"
)]
pub async fn list_containers(pool: Extension<PgPool>) -> impl IntoResponse {
    match repo::list_containers(&pool).await {
        Ok(containers) => (StatusCode::OK, Json(containers)).into_response(),
        Err(err) => {
            error!("Failed to list containers: {err:#}");
            internal_error()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/containers/{id}",
    params(("id" = String, Path, description = "Container id")),
    responses(
        (status = 200, description = "Container", body = Container),
        (status = 404, description = "Unknown container", body = ErrorResponse)
    ),
    tag = "containers"
)]
pub async fn get_container(Path(id): Path<String>, pool: Extension<PgPool>) -> impl IntoResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match repo::get_container(&pool, id).await {
        Ok(Some(container)) => (StatusCode::OK, Json(container)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, NOT_FOUND),
        Err(err) => {
            error!("Failed to fetch container: {err:#}");
            internal_error()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/containers",
    request_body = ContainerInput,
    responses(
        (status = 201, description = "Container created", body = Container),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Admin session required", body = ErrorResponse)
    ),
    tag = "containers"
)]
pub async fn create_container(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    service: Extension<Arc<MagicLinkService>>,
    payload: Result<Json<ContainerInput>, JsonRejection>,
) -> impl IntoResponse {
    let admin = match require_admin(&headers, &service).await {
        Ok(admin) => admin,
        Err(response) => return response,
    };
    let fields = match validated(payload) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    match repo::create_container(&pool, &fields).await {
        Ok(container) => {
            info!(container_id = %container.id, admin = %admin.email, "container created");
            (StatusCode::CREATED, Json(container)).into_response()
        }
        Err(err) => {
            error!("Failed to create container: {err:#}");
            internal_error()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/containers/{id}",
    params(("id" = String, Path, description = "Container id")),
    request_body = ContainerInput,
    responses(
        (status = 200, description = "Container updated", body = Container),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Admin session required", body = ErrorResponse),
        (status = 404, description = "Unknown container", body = ErrorResponse)
    ),
    tag = "containers"
)]
pub async fn update_container(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    service: Extension<Arc<MagicLinkService>>,
    payload: Result<Json<ContainerInput>, JsonRejection>,
) -> impl IntoResponse {
    let admin = match require_admin(&headers, &service).await {
        Ok(admin) => admin,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let fields = match validated(payload) {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    match repo::update_container(&pool, id, &fields).await {
        Ok(Some(container)) => {
            info!(container_id = %id, admin = %admin.email, "container updated");
            (StatusCode::OK, Json(container)).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, NOT_FOUND),
        Err(err) => {
            error!("Failed to update container: {err:#}");
            internal_error()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/containers/{id}",
    params(("id" = String, Path, description = "Container id")),
    responses(
        (status = 200, description = "Container deleted", body = MessageResponse),
        (status = 401, description = "Admin session required", body = ErrorResponse),
        (status = 404, description = "Unknown container", body = ErrorResponse),
        (status = 409, description = "Container has purchases", body = ErrorResponse)
    ),
    tag = "containers"
)]
pub async fn delete_container(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    service: Extension<Arc<MagicLinkService>>,
) -> impl IntoResponse {
    let admin = match require_admin(&headers, &service).await {
        Ok(admin) => admin,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match repo::delete_container(&pool, id).await {
        Ok(DeleteOutcome::Deleted) => {
            info!(container_id = %id, admin = %admin.email, "container deleted");
            message_response(StatusCode::OK, "Container deleted successfully")
        }
        Ok(DeleteOutcome::NotFound) => error_response(StatusCode::NOT_FOUND, NOT_FOUND),
        Ok(DeleteOutcome::InUse) => error_response(
            StatusCode::CONFLICT,
            "Container has purchases and cannot be deleted",
        ),
        Err(err) => {
            error!("Failed to delete container: {err:#}");
            internal_error()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/containers/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching containers", body = [Container]),
        (status = 401, description = "Admin session required", body = ErrorResponse)
    ),
    tag = "containers"
)]
pub async fn search_containers(
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    service: Extension<Arc<MagicLinkService>>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &service).await {
        return response;
    }

    match repo::list_containers(&pool).await {
        Ok(containers) => {
            let found = search(containers, params.q.as_deref().unwrap_or_default());
            (StatusCode::OK, Json(found)).into_response()
        }
        Err(err) => {
            error!("Failed to search containers: {err:#}");
            internal_error()
        }
    }
}
