//! Notifications Domain
//!
//! Server-side delivery of tutoring-center notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   API Handler   │  ← validated request payload
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ DeliveryService │  ← renders, then sends with retry
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ TemplateRenderer│  ← Handlebars HTML + derived plain text
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ProviderRegistry │  ← override, else Resend → SendGrid → SMTP
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Email Provider  │  ← transient / permanent classification
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_config::FromEnv;
//! use domain_notifications::{DeliveryService, EmailConfig};
//!
//! let service = DeliveryService::from_config(&EmailConfig::from_env()?)?;
//! let receipt = service.send_change_request("center@example.com", &request).await?;
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod retry;
pub mod selection;
pub mod service;
pub mod templates;

// Re-export commonly used types
pub use config::{EmailConfig, Sender};
pub use error::{ErrorCategory, NotificationError, NotificationResult};
pub use models::{
    AttemptOutcome, ChangeRequestContext, DeliveryAttempt, DeliveryReceipt, ParentMessage,
    ProviderName,
};
pub use providers::{
    EmailContent, EmailProvider, MockOutcome, MockProvider, ResendProvider, SendGridProvider,
    SentEmail, SmtpProvider,
};
pub use retry::RetryPolicy;
pub use selection::{ProviderRegistry, ProviderStatus};
pub use service::DeliveryService;
pub use templates::{RenderedEmail, TemplateRenderer};
