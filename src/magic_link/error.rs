use thiserror::Error;

/// Outcomes of the magic-link flow that callers must tell apart.
///
/// `Invalid` deliberately covers both unknown and expired tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is not allowed to request a magic link")]
    Unauthorized,
    #[error("invalid or expired token")]
    Invalid,
    #[error("failed to deliver magic link: {0:#}")]
    Mailer(anyhow::Error),
    #[error("auth store failure: {0:#}")]
    Store(anyhow::Error),
}

impl AuthError {
    /// True for failures on our side (store, mailer) as opposed to bad input.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Mailer(_) | Self::Store(_))
    }
}
