use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authorization level attached to a session. The back-office only knows admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
        }
    }

    /// Parse the persisted `admin_sessions.role` value.
    pub(crate) fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid admin_sessions.role value: {value}"),
            )))),
        }
    }
}

/// Identity yielded by a consumed magic-link token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub email: String,
    pub role: Role,
}

impl AdminIdentity {
    #[must_use]
    pub fn admin(email: String) -> Self {
        Self {
            email,
            role: Role::Admin,
        }
    }
}

/// An authenticated back-office session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// A freshly bound session; `token` is the raw value for the cookie and is never stored.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: AdminSession,
}
