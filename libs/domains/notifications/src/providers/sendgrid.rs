//! SendGrid email provider implementation.

use super::{EmailContent, EmailProvider, SentEmail, request_error, status_error};
use crate::config::Sender;
use crate::error::NotificationResult;
use crate::models::ProviderName;
use async_trait::async_trait;
use core_config::{env_optional, env_or_default};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// SendGrid API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendGridConfig {
    pub api_key: String,
    /// SendGrid API base URL (defaults to production).
    pub api_url: String,
}

impl SendGridConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: SENDGRID_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// `None` unless `SENDGRID_API_KEY` is set.
    pub fn load_from_env() -> Option<Self> {
        env_optional("SENDGRID_API_KEY")
            .map(|key| Self::new(key).with_api_url(env_or_default("SENDGRID_API_URL", SENDGRID_API_URL)))
    }
}

/// SendGrid email provider.
pub struct SendGridProvider {
    config: SendGridConfig,
    sender: Sender,
    client: Client,
}

impl SendGridProvider {
    pub fn new(config: SendGridConfig, sender: Sender) -> Self {
        Self {
            config,
            sender,
            client: Client::new(),
        }
    }

    fn build_request(&self, email: &EmailContent) -> SendGridRequest {
        SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress::named(&email.to_email, &email.to_name)],
                cc: email.cc.iter().map(|addr| EmailAddress::bare(addr)).collect(),
                bcc: email.bcc.iter().map(|addr| EmailAddress::bare(addr)).collect(),
            }],
            from: EmailAddress::named(&self.sender.email, &self.sender.name),
            reply_to: email.reply_to.as_deref().map(EmailAddress::bare),
            subject: email.subject.clone(),
            content: vec![
                Content {
                    content_type: "text/plain",
                    value: email.text_body.clone(),
                },
                Content {
                    content_type: "text/html",
                    value: email.html_body.clone(),
                },
            ],
        }
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl EmailAddress {
    fn bare(email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: None,
        }
    }

    fn named(email: &str, name: &str) -> Self {
        Self {
            email: email.to_string(),
            name: (!name.is_empty()).then(|| name.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
}

/// Flatten SendGrid's `{"errors":[{"message":..}]}` body, or pass it through.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<SendGridError>(body) {
        Ok(parsed) => parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(", "),
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        let request = self.build_request(email);

        debug!(
            provider = %self.name(),
            to = %email.to_email,
            subject = %email.subject,
            cc_count = email.cc.len(),
            bcc_count = email.bcc.len(),
            has_reply_to = email.reply_to.is_some(),
            "Sending email via SendGrid"
        );

        let response = self
            .client
            .post(format!("{}/mail/send", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(self.name(), e))?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status.is_success() {
            info!(
                provider = %self.name(),
                to = %email.to_email,
                message_id = ?message_id,
                "Email sent successfully via SendGrid"
            );
            return Ok(SentEmail { message_id });
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        error!(
            provider = %self.name(),
            to = %email.to_email,
            status = %status,
            error = %detail,
            "Failed to send email via SendGrid"
        );

        Err(status_error(self.name(), status, &detail))
    }

    fn name(&self) -> ProviderName {
        ProviderName::Sendgrid
    }
}
