//! Admin authentication handlers.
//!
//! Sign-in is by magic link only. `POST /api/magic-link` emails a link to an
//! allow-listed admin; the link lands on the frontend, which posts the token to
//! `/api/verify-magic-link` (or `{email, token}` to `/api/auth/magic-link`) to
//! receive the `boxport_session` cookie. Bearer tokens are accepted wherever the
//! cookie is.

pub(crate) mod magic_link;
pub(crate) mod session;
pub(crate) mod types;

pub(crate) use session::require_admin;
