//! Email delivery abstractions.
//!
//! The magic-link flow hands each message to an `EmailSender` and waits for the
//! result, so a failed delivery can roll back the token it was carrying.
//!
//! - `LogEmailSender` logs the message and returns `Ok(())`. Used for local dev
//!   when no email API is configured.
//! - `HttpEmailSender` posts the message as JSON to a transactional email API
//!   (Brevo-compatible `POST /v3/smtp/email` payload) and treats any non-2xx
//!   answer as a failure.
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

use crate::APP_USER_AGENT;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Email delivery abstraction used by the magic-link issuer.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error describing why it was not accepted.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.text_body,
            "email send stub"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody<'a> {
    sender: EmailAddress<'a>,
    to: Vec<EmailAddress<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

/// Sender backed by a transactional email HTTP API.
#[derive(Debug)]
pub struct HttpEmailSender {
    client: Client,
    endpoint: Url,
    api_key: SecretString,
    from_email: String,
}

impl HttpEmailSender {
    /// # Errors
    /// Returns an error if the endpoint is not a valid http(s) URL, the sender address
    /// is empty, or the HTTP client cannot be built.
    pub fn new(endpoint: &str, api_key: SecretString, from_email: String) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("Invalid email API URL: {endpoint}"))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!("Email API URL must use http or https: {endpoint}"));
        }
        if from_email.trim().is_empty() {
            return Err(anyhow!("Email sender address is required"));
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            from_email: from_email.trim().to_string(),
        })
    }

    fn body<'a>(&'a self, message: &'a EmailMessage) -> SendEmailBody<'a> {
        SendEmailBody {
            sender: EmailAddress {
                email: &self.from_email,
            },
            to: vec![EmailAddress {
                email: &message.to_email,
            }],
            subject: &message.subject,
            html_content: &message.html_body,
            text_content: &message.text_body,
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    #[instrument(skip(self, message), fields(to_email = %message.to_email))]
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("api-key", self.api_key.expose_secret())
            .header("accept", "application/json")
            .json(&self.body(message))
            .send()
            .await
            .context("email API request failed")?;

        let status = response.status();
        if status.is_success() {
            debug!("email accepted by API: {status}");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("email API rejected message (status={status}): {body}"))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to_email: "admin@example.com".to_string(),
            subject: "Your Magic Link".to_string(),
            text_body: "Click here to log in: https://boxport.dev/admin/verify?token=t".to_string(),
            html_body: "<p>Click here</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn log_sender_accepts_everything() -> Result<()> {
        LogEmailSender.send(&message()).await
    }

    #[test]
    fn http_sender_rejects_bad_endpoints() {
        let key = || SecretString::from("key".to_string());
        assert!(HttpEmailSender::new("not a url", key(), "noreply@boxport.dev".into()).is_err());
        assert!(
            HttpEmailSender::new("ftp://mail.test/send", key(), "noreply@boxport.dev".into())
                .is_err()
        );
        assert!(HttpEmailSender::new("https://mail.test/send", key(), " ".into()).is_err());
    }

    #[test]
    fn http_sender_body_uses_api_field_names() -> Result<()> {
        let sender = HttpEmailSender::new(
            "https://api.mail.test/v3/smtp/email",
            SecretString::from("key".to_string()),
            "noreply@boxport.dev".to_string(),
        )?;
        let message = message();
        let value = serde_json::to_value(sender.body(&message))?;

        let from = value
            .pointer("/sender/email")
            .and_then(serde_json::Value::as_str)
            .context("missing sender")?;
        assert_eq!(from, "noreply@boxport.dev");
        let to = value
            .pointer("/to/0/email")
            .and_then(serde_json::Value::as_str)
            .context("missing recipient")?;
        assert_eq!(to, "admin@example.com");
        assert!(value.get("htmlContent").is_some());
        assert!(value.get("textContent").is_some());
        Ok(())
    }
}
