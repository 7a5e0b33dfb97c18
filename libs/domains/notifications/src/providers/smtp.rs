//! SMTP email provider implementation using lettre.

use super::{EmailContent, EmailProvider, SentEmail};
use crate::config::Sender;
use crate::error::{NotificationError, NotificationResult};
use crate::models::ProviderName;
use async_trait::async_trait;
use core_config::{ConfigError, env_flag, env_optional, env_parse_or};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{self, authentication::Credentials},
};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_SMTP_PORT: u16 = 587;
const IMPLICIT_TLS_PORT: u16 = 465;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP configuration. Host, username and password are all required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// STARTTLS (or implicit TLS on 465) when true; plaintext otherwise.
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SMTP_PORT,
            username: username.into(),
            password: password.into(),
            use_tls: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// `Ok(None)` unless `SMTP_HOST`, `SMTP_USERNAME` and `SMTP_PASSWORD` are all set.
    pub fn load_from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(host), Some(username), Some(password)) = (
            env_optional("SMTP_HOST"),
            env_optional("SMTP_USERNAME"),
            env_optional("SMTP_PASSWORD"),
        ) else {
            return Ok(None);
        };

        Ok(Some(
            Self::new(host, username, password)
                .with_port(env_parse_or("SMTP_PORT", DEFAULT_SMTP_PORT)?)
                .with_tls(env_flag("SMTP_USE_TLS", true)),
        ))
    }
}

/// SMTP email provider.
pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
    sender: Sender,
}

impl SmtpProvider {
    /// Build the provider. No connection is opened until the first send.
    pub fn new(config: SmtpConfig, sender: Sender) -> NotificationResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self {
            transport,
            config,
            sender,
        })
    }

    fn build_transport(config: &SmtpConfig) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if !config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        } else if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotificationError::Configuration(format!("Failed to create SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotificationError::Configuration(format!("Failed to create SMTP relay: {e}")))?
        };

        Ok(builder
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .timeout(Some(CONNECT_TIMEOUT))
            .build())
    }

    /// Build a lettre Message from EmailContent.
    ///
    /// Address errors are permanent: resending the same message cannot fix them.
    fn build_message(&self, email: &EmailContent) -> NotificationResult<Message> {
        let invalid = |what: &str, e: &dyn std::fmt::Display| {
            NotificationError::permanent(ProviderName::Smtp, format!("Invalid {what}: {e}"))
        };

        let from: Mailbox = self
            .sender
            .mailbox()
            .parse()
            .map_err(|e| invalid("from address", &e))?;

        let to: Mailbox = if email.to_name.is_empty() {
            email.to_email.parse()
        } else {
            format!("{} <{}>", email.to_name, email.to_email).parse()
        }
        .map_err(|e| invalid("to address", &e))?;

        let mut builder = Message::builder().from(from).to(to).subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse().map_err(|e| invalid("reply-to address", &e))?);
        }
        for cc in &email.cc {
            builder = builder.cc(cc.parse().map_err(|e| invalid("CC address", &e))?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(bcc.parse().map_err(|e| invalid("BCC address", &e))?);
        }

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| invalid("message", &e))
    }
}

/// 5yz replies are permanent; 4yz replies and connection or TLS trouble are transient.
fn classify_send_error(err: &smtp::Error) -> NotificationError {
    if err.is_permanent() {
        NotificationError::permanent(ProviderName::Smtp, err.to_string())
    } else {
        NotificationError::transient(ProviderName::Smtp, err.to_string())
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        debug!(
            provider = %self.name(),
            to = %email.to_email,
            subject = %email.subject,
            host = %self.config.host,
            port = %self.config.port,
            tls = self.config.use_tls,
            cc_count = email.cc.len(),
            bcc_count = email.bcc.len(),
            has_reply_to = email.reply_to.is_some(),
            "Sending email via SMTP"
        );

        let message = self.build_message(email)?;

        let response = self.transport.send(message).await.map_err(|e| {
            error!(
                provider = %self.name(),
                to = %email.to_email,
                error = %e,
                "Failed to send email via SMTP"
            );
            classify_send_error(&e)
        })?;

        let message_id = response.message().next().map(|s| s.to_string());

        info!(
            provider = %self.name(),
            to = %email.to_email,
            message_id = ?message_id,
            "Email sent successfully via SMTP"
        );

        Ok(SentEmail { message_id })
    }

    fn name(&self) -> ProviderName {
        ProviderName::Smtp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SmtpProvider {
        SmtpProvider::new(
            SmtpConfig::new("localhost", "mailer", "secret").with_tls(false).with_port(2525),
            Sender::new("noreply@example.com", "Tutoring Center"),
        )
        .unwrap()
    }

    #[test]
    fn test_smtp_config_new() {
        let config = SmtpConfig::new("mail.example.com", "user", "pass");
        assert_eq!(config.port, 587);
        assert!(config.use_tls);
    }

    #[test]
    fn test_smtp_config_from_env() {
        temp_env::with_vars(
            [
                ("SMTP_HOST", Some("smtp.example.com")),
                ("SMTP_USERNAME", Some("mailer")),
                ("SMTP_PASSWORD", Some("secret")),
                ("SMTP_PORT", Some("2525")),
                ("SMTP_USE_TLS", Some("false")),
            ],
            || {
                let config = SmtpConfig::load_from_env().unwrap().unwrap();
                assert_eq!(config.port, 2525);
                assert!(!config.use_tls);
            },
        );
    }

    #[test]
    fn test_smtp_config_bad_port() {
        temp_env::with_vars(
            [
                ("SMTP_HOST", Some("smtp.example.com")),
                ("SMTP_USERNAME", Some("mailer")),
                ("SMTP_PASSWORD", Some("secret")),
                ("SMTP_PORT", Some("smtp")),
            ],
            || {
                assert!(SmtpConfig::load_from_env().is_err());
            },
        );
    }

    #[test]
    fn test_smtp_config_requires_password() {
        temp_env::with_vars(
            [
                ("SMTP_HOST", Some("smtp.example.com")),
                ("SMTP_USERNAME", Some("mailer")),
                ("SMTP_PASSWORD", None),
            ],
            || {
                assert!(SmtpConfig::load_from_env().unwrap().is_none());
            },
        );
    }

    #[test]
    fn test_build_message_sets_reply_to() {
        let email = EmailContent {
            to_email: "center@example.com".into(),
            subject: "Schedule Change Request".into(),
            html_body: "<p>Hi</p>".into(),
            text_body: "Hi".into(),
            reply_to: Some("mary@example.com".into()),
            ..Default::default()
        };

        let message = provider().build_message(&email).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Reply-To: mary@example.com"));
        assert!(raw.contains("To: center@example.com"));
        assert!(raw.contains("Subject: Schedule Change Request"));
    }

    #[test]
    fn test_bad_recipient_is_permanent() {
        let email = EmailContent {
            to_email: "not an address".into(),
            ..Default::default()
        };

        let err = provider().build_message(&email).unwrap_err();
        assert!(!err.is_retryable());
    }
}
