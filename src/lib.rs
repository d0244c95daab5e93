//! # Boxport (Shipping Container Storefront)
//!
//! `boxport` serves the public container catalog, records purchases confirmed by
//! the payment gateway, and runs the admin back-office API.
//!
//! ## Admin Authentication (Magic Links)
//!
//! Admins sign in with emailed magic links. Only addresses on the configured
//! allow-list may request a link; any other address gets `403` and nothing is
//! stored or sent.
//!
//! - **Rotation:** Requesting a link overwrites the earlier token for that email,
//!   so only the most recent link works.
//! - **Expiry:** Tokens live for 15 minutes by default. Expired rows are rejected at
//!   read time and removed by a background sweeper.
//! - **Single use:** Verification is one atomic `DELETE ... RETURNING`. Whichever
//!   route presents the token first consumes it; every later attempt fails.
//! - **Hashing:** Only SHA-256 hashes of link and session tokens are persisted.
//!
//! ## Catalog & Purchases
//!
//! Container listings are public to read and admin-only to write. Purchases are
//! created by the checkout flow after the gateway confirms payment, and mark the
//! container unavailable in the same transaction.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod db;
pub mod email;
pub mod magic_link;
pub mod purchases;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
