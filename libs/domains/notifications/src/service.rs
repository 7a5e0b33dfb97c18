//! Delivery service: render, pick the resolved provider, send with retry.

use crate::config::EmailConfig;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{ChangeRequestContext, DeliveryReceipt, ParentMessage};
use crate::providers::EmailContent;
use crate::retry::RetryPolicy;
use crate::selection::{ProviderRegistry, ProviderStatus};
use crate::templates::TemplateRenderer;
use domain_compose::sanitize::is_valid_address;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Stateless across requests; clone freely.
#[derive(Clone)]
pub struct DeliveryService {
    registry: ProviderRegistry,
    renderer: TemplateRenderer,
    retry: RetryPolicy,
}

impl DeliveryService {
    pub fn new(registry: ProviderRegistry, renderer: TemplateRenderer, retry: RetryPolicy) -> Self {
        Self {
            registry,
            renderer,
            retry,
        }
    }

    /// Resolve the provider and build the renderer once, at startup.
    pub fn from_config(config: &EmailConfig) -> NotificationResult<Self> {
        Ok(Self::new(
            ProviderRegistry::resolve(config),
            TemplateRenderer::new()?,
            RetryPolicy::default().with_base_delay(config.retry_base_delay),
        ))
    }

    pub fn provider_status(&self) -> &ProviderStatus {
        self.registry.status()
    }

    /// Send prepared content through the resolved provider.
    ///
    /// Fails without any attempt when no provider is configured.
    #[instrument(skip_all, fields(to = %email.to_email))]
    pub async fn deliver(&self, email: &EmailContent) -> NotificationResult<DeliveryReceipt> {
        if !is_valid_address(&email.to_email) {
            return Err(NotificationError::InvalidInput(format!(
                "'{}' is not a valid recipient address",
                email.to_email
            )));
        }

        let provider = self.registry.provider()?;
        let run = self.retry.run(provider.as_ref(), email).await;

        match run.result {
            Ok(sent) => {
                let receipt = DeliveryReceipt {
                    id: Uuid::new_v4(),
                    provider: provider.name(),
                    message_id: sent.message_id,
                    attempts: run.attempts,
                };
                info!(
                    id = %receipt.id,
                    provider = %receipt.provider,
                    attempts = receipt.attempts.len(),
                    "Email delivered"
                );
                Ok(receipt)
            }
            Err(e) => {
                error!(
                    provider = %provider.name(),
                    attempts = run.attempts.len(),
                    error = %e,
                    "Email delivery failed"
                );
                Err(e)
            }
        }
    }

    /// Render and deliver a schedule change request. Replies go to the parent.
    pub async fn send_change_request(
        &self,
        to: &str,
        request: &ChangeRequestContext,
    ) -> NotificationResult<DeliveryReceipt> {
        request.validate()?;
        let rendered = self.renderer.render_change_request(request)?;
        let email = EmailContent::new(to.trim(), rendered).with_reply_to(&request.parent_email);
        self.deliver(&email).await
    }

    /// Render and deliver a free-form parent message.
    pub async fn send_parent_message(&self, message: &ParentMessage) -> NotificationResult<DeliveryReceipt> {
        message.validate()?;
        let rendered = self.renderer.render_parent_message(message)?;
        let email = EmailContent::new(message.to.trim(), rendered);
        self.deliver(&email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::models::{AttemptOutcome, ProviderName};
    use crate::providers::{MockEmailProvider, SentEmail};
    use std::sync::Arc;

    fn service(provider: MockEmailProvider) -> DeliveryService {
        DeliveryService::new(
            ProviderRegistry::with_provider(Arc::new(provider)),
            TemplateRenderer::new().unwrap(),
            RetryPolicy::default(),
        )
    }

    fn named(name: ProviderName) -> MockEmailProvider {
        let mut provider = MockEmailProvider::new();
        provider.expect_name().return_const(name);
        provider
    }

    fn message() -> ParentMessage {
        ParentMessage {
            to: "center@example.com".into(),
            student_name: "Jane Doe".into(),
            parent_name: "Mary Doe".into(),
            message: "Jane will be late today.".into(),
        }
    }

    fn change_request() -> ChangeRequestContext {
        ChangeRequestContext {
            parent_name: "Mary Doe".into(),
            parent_email: "mary@example.com".into(),
            parent_phone: String::new(),
            student_name: "Jane Doe".into(),
            student_id: String::new(),
            current_schedule: "Monday 3:00 PM".into(),
            requested_change: "Tuesday 4:00 PM".into(),
            reason: "Soccer".into(),
            effective_date: "next week".into(),
            additional_notes: None,
        }
    }

    #[tokio::test]
    async fn test_delivers_parent_message() {
        let mut provider = named(ProviderName::Resend);
        provider
            .expect_send()
            .withf(|email| {
                email.to_email == "center@example.com"
                    && email.subject == "Message from Mary Doe regarding Jane Doe"
                    && email.text_body.contains("Jane will be late today.")
            })
            .times(1)
            .returning(|_| {
                Ok(SentEmail {
                    message_id: Some("re_1".into()),
                })
            });

        let receipt = service(provider).send_parent_message(&message()).await.unwrap();

        assert_eq!(receipt.provider, ProviderName::Resend);
        assert_eq!(receipt.message_id.as_deref(), Some("re_1"));
        assert_eq!(receipt.attempts.len(), 1);
        assert_eq!(receipt.id.get_version_num(), 4);
    }

    #[tokio::test]
    async fn test_change_request_replies_to_parent() {
        let mut provider = named(ProviderName::Smtp);
        provider
            .expect_send()
            .withf(|email| email.reply_to.as_deref() == Some("mary@example.com"))
            .times(1)
            .returning(|_| Ok(SentEmail::default()));

        let receipt = service(provider)
            .send_change_request("center@example.com", &change_request())
            .await
            .unwrap();
        assert_eq!(receipt.provider, ProviderName::Smtp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_three_attempts() {
        let mut provider = named(ProviderName::Sendgrid);
        provider
            .expect_send()
            .times(3)
            .returning(|_| Err(NotificationError::transient(ProviderName::Sendgrid, "HTTP 503")));

        let err = service(provider).send_parent_message(&message()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Transient);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let mut provider = named(ProviderName::Sendgrid);
        let mut seq = mockall::Sequence::new();
        provider
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(NotificationError::transient(ProviderName::Sendgrid, "HTTP 429")));
        provider
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(SentEmail::default()));

        let receipt = service(provider).send_parent_message(&message()).await.unwrap();
        let outcomes: Vec<_> = receipt.attempts.iter().map(|a| a.outcome).collect();
        assert_eq!(outcomes, vec![AttemptOutcome::TransientFailure, AttemptOutcome::Success]);
    }

    #[tokio::test]
    async fn test_permanent_failure_sends_once() {
        let mut provider = named(ProviderName::Resend);
        provider
            .expect_send()
            .times(1)
            .returning(|_| Err(NotificationError::permanent(ProviderName::Resend, "HTTP 422")));

        let err = service(provider).send_parent_message(&message()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Permanent);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_provider() {
        let mut provider = named(ProviderName::Resend);
        provider.expect_send().times(0);
        let service = service(provider);

        let mut bad = message();
        bad.to = "not-an-address".into();
        let err = service.send_parent_message(&bad).await.unwrap_err();
        assert!(matches!(err, NotificationError::InvalidInput(_)));

        let err = service
            .send_change_request("a@example.com, b@example.com", &change_request())
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_no_provider_is_configuration_error() {
        let service = DeliveryService::new(
            ProviderRegistry::empty(),
            TemplateRenderer::new().unwrap(),
            RetryPolicy::default(),
        );

        let err = service.send_parent_message(&message()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(service.provider_status().selected, None);
    }
}
