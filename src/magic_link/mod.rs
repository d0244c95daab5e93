//! Magic-link authentication for the admin back-office.
//!
//! Flow: the client posts an email, the issuer checks it against the allow-list,
//! rotates the stored token and mails the link. Following the link consumes the
//! token exactly once and binds an admin session.

pub mod allow_list;
pub mod clock;
pub mod config;
pub mod error;
#[cfg(test)]
pub(crate) mod memory;
pub mod models;
pub mod service;
pub mod store;
pub mod sweeper;
pub(crate) mod utils;

pub use allow_list::AdminAllowList;
pub use clock::{Clock, SystemClock};
pub use config::MagicLinkConfig;
pub use error::AuthError;
pub use models::{AdminIdentity, AdminSession, IssuedSession, Role};
pub use service::MagicLinkService;
pub use store::{AuthStore, PgAuthStore};
