//! Magic-link endpoints: request a link, follow it, or exchange it for a session.

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

use super::session::session_cookie;
use super::types::{MagicLinkCredentials, MagicLinkRequest, VerifiedResponse, VerifyMagicLinkRequest};
use crate::api::handlers::{ErrorResponse, MessageResponse, error_response, message_response};
use crate::magic_link::{AuthError, IssuedSession, MagicLinkService};

const INVALID_TOKEN: &str = "Invalid or expired token";

/// Email a sign-in link to an allow-listed admin.
#[utoipa::path(
    post,
    path = "/api/magic-link",
    request_body = MagicLinkRequest,
    responses(
        (status = 200, description = "Magic link sent", body = MessageResponse),
        (status = 400, description = "Missing email", body = ErrorResponse),
        (status = 403, description = "Email is not an admin", body = ErrorResponse),
        (status = 500, description = "Link could not be stored or delivered", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn request_magic_link(
    service: Extension<Arc<MagicLinkService>>,
    payload: Result<Json<MagicLinkRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected magic link payload: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "Missing payload");
        }
    };

    let Some(email) = request.email.filter(|email| !email.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Email is required");
    };

    match service.request_link(&email).await {
        Ok(()) => message_response(StatusCode::OK, "Magic link sent!"),
        Err(err) if err.is_server_error() => {
            error!("Failed to issue magic link: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send magic link",
            )
        }
        Err(AuthError::Unauthorized) => error_response(StatusCode::FORBIDDEN, "Unauthorized"),
        Err(_) => error_response(StatusCode::BAD_REQUEST, "Invalid request"),
    }
}

/// Consume a followed link and start an admin session.
#[utoipa::path(
    post,
    path = "/api/verify-magic-link",
    request_body = VerifyMagicLinkRequest,
    responses(
        (status = 200, description = "Token accepted; session cookie set", body = VerifiedResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Verification failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_magic_link(
    service: Extension<Arc<MagicLinkService>>,
    payload: Result<Json<VerifyMagicLinkRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected verify payload: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "Missing payload");
        }
    };

    let Some(token) = request.token.filter(|token| !token.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Token is required");
    };

    match service.verify_and_bind(&token).await {
        Ok(issued) => session_started(&service, &issued),
        Err(err) if err.is_server_error() => {
            error!("Failed to verify magic link: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed")
        }
        Err(_) => error_response(StatusCode::BAD_REQUEST, INVALID_TOKEN),
    }
}

/// Exchange `{email, token}` for a session; the token must have been issued to `email`.
#[utoipa::path(
    post,
    path = "/api/auth/magic-link",
    request_body = MagicLinkCredentials,
    responses(
        (status = 200, description = "Credentials accepted; session cookie set", body = VerifiedResponse),
        (status = 400, description = "Missing email or token", body = ErrorResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Sign-in failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn exchange_magic_link(
    service: Extension<Arc<MagicLinkService>>,
    payload: Result<Json<MagicLinkCredentials>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected credentials payload: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, "Missing payload");
        }
    };

    let email = request.email.filter(|email| !email.trim().is_empty());
    let token = request.token.filter(|token| !token.trim().is_empty());
    let (Some(email), Some(token)) = (email, token) else {
        return error_response(StatusCode::BAD_REQUEST, "Email and token are required");
    };

    match service.bind(&email, &token).await {
        Ok(issued) => session_started(&service, &issued),
        Err(err) if err.is_server_error() => {
            error!("Failed to exchange magic link: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Sign-in failed")
        }
        Err(_) => error_response(StatusCode::UNAUTHORIZED, INVALID_TOKEN),
    }
}

fn session_started(service: &MagicLinkService, issued: &IssuedSession) -> Response {
    let cookie = match session_cookie(service.config(), &issued.token) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed");
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(VerifiedResponse {
            success: true,
            email: issued.session.email.clone(),
        }),
    )
        .into_response()
}
