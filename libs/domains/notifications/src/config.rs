//! Environment-driven configuration for outbound email.

use crate::models::ProviderName;
use crate::providers::{ResendConfig, SendGridConfig, SmtpConfig};
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_or};
use std::time::Duration;

pub const DEFAULT_FROM_EMAIL: &str = "noreply@localhost";
pub const DEFAULT_FROM_NAME: &str = "Tutoring Center";
pub const DEFAULT_RETRY_BASE_MS: u64 = 500;

/// Identity every outbound message is sent as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

impl Sender {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// `Name <email>`, or the bare address when there is no name.
    pub fn mailbox(&self) -> String {
        if self.name.is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }
}

impl Default for Sender {
    fn default() -> Self {
        Self::new(DEFAULT_FROM_EMAIL, DEFAULT_FROM_NAME)
    }
}

/// Everything needed to resolve and drive a provider.
///
/// A provider section is `Some` only when its full credential set is present.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider_override: Option<ProviderName>,
    pub sender: Sender,
    pub resend: Option<ResendConfig>,
    pub sendgrid: Option<SendGridConfig>,
    pub smtp: Option<SmtpConfig>,
    pub retry_base_delay: Duration,
}

impl EmailConfig {
    pub fn new(sender: Sender) -> Self {
        Self {
            provider_override: None,
            sender,
            resend: None,
            sendgrid: None,
            smtp: None,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
        }
    }

    pub fn with_override(mut self, provider: ProviderName) -> Self {
        self.provider_override = Some(provider);
        self
    }

    pub fn with_resend(mut self, config: ResendConfig) -> Self {
        self.resend = Some(config);
        self
    }

    pub fn with_sendgrid(mut self, config: SendGridConfig) -> Self {
        self.sendgrid = Some(config);
        self
    }

    pub fn with_smtp(mut self, config: SmtpConfig) -> Self {
        self.smtp = Some(config);
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self::new(Sender::default())
    }
}

impl FromEnv for EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let provider_override = env_optional("EMAIL_PROVIDER")
            .map(|raw| {
                raw.parse::<ProviderName>()
                    .map_err(|_| ConfigError::ParseError {
                        key: "EMAIL_PROVIDER".to_string(),
                        details: format!("unknown provider '{raw}', expected resend, sendgrid or smtp"),
                    })
            })
            .transpose()?;

        let sender = Sender::new(
            env_or_default("EMAIL_FROM", DEFAULT_FROM_EMAIL),
            env_or_default("EMAIL_FROM_NAME", DEFAULT_FROM_NAME),
        );

        Ok(Self {
            provider_override,
            sender,
            resend: ResendConfig::load_from_env(),
            sendgrid: SendGridConfig::load_from_env(),
            smtp: SmtpConfig::load_from_env()?,
            retry_base_delay: Duration::from_millis(env_parse_or(
                "EMAIL_RETRY_BASE_MS",
                DEFAULT_RETRY_BASE_MS,
            )?),
        })
    }
}
