//! Resend email provider implementation.

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

pub const RESEND_API_URL: &str = "https://api.resend.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Resend API configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendConfig {
    pub api_key: String,
    pub api_url: String,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: RESEND_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// `None` unless `RESEND_API_KEY` is set.
    pub fn load_from_env() -> Option<Self> {
        env_optional("RESEND_API_KEY")
            .map(|key| Self::new(key).with_api_url(env_or_default("RESEND_API_URL", RESEND_API_URL)))
    }
}

/// Resend email provider.
pub struct ResendProvider {
    config: ResendConfig,
    sender: Sender,
    client: Client,
}

impl ResendProvider {
    pub fn new(config: ResendConfig, sender: Sender) -> Self {
        Self {
            config,
            sender,
            client: Client::new(),
        }
    }

    fn build_request<'a>(&'a self, email: &'a EmailContent) -> ResendRequest<'a> {
        let to = if email.to_name.is_empty() {
            email.to_email.clone()
        } else {
            format!("{} <{}>", email.to_name, email.to_email)
        };

        ResendRequest {
            from: self.sender.mailbox(),
            to: vec![to],
            cc: &email.cc,
            bcc: &email.bcc,
            reply_to: email.reply_to.as_deref(),
            subject: &email.subject,
            html: &email.html_body,
            text: &email.text_body,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: Vec<String>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    cc: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    bcc: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResendError {
    message: String,
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        debug!(
            provider = %self.name(),
            to = %email.to_email,
            subject = %email.subject,
            cc_count = email.cc.len(),
            bcc_count = email.bcc.len(),
            has_reply_to = email.reply_to.is_some(),
            "Sending email via Resend"
        );

        let response = self
            .client
            .post(format!("{}/emails", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&self.build_request(email))
            .send()
            .await
            .map_err(|e| request_error(self.name(), e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            let message_id = serde_json::from_str::<ResendResponse>(&body)
                .ok()
                .map(|r| r.id);
            info!(
                provider = %self.name(),
                to = %email.to_email,
                message_id = ?message_id,
                "Email sent successfully via Resend"
            );
            return Ok(SentEmail { message_id });
        }

        let detail = serde_json::from_str::<ResendError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        error!(
            provider = %self.name(),
            to = %email.to_email,
            status = %status,
            error = %detail,
            "Failed to send email via Resend"
        );

        Err(status_error(self.name(), status, &detail))
    }

    fn name(&self) -> ProviderName {
        ProviderName::Resend
    }
}
