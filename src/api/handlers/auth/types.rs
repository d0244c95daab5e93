//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::magic_link::Role;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct MagicLinkRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct VerifyMagicLinkRequest {
    #[serde(default)]
    pub token: Option<String>,
}

/// Credential-style exchange: the token must belong to `email`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct MagicLinkCredentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct VerifiedResponse {
    pub success: bool,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionResponse {
    pub email: String,
    pub role: Role,
}
