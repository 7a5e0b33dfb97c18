//! Provider resolution.
//!
//! Candidates are declared once, in priority order, as (credential check,
//! constructor) pairs. Resolution runs at startup and yields at most one
//! adapter, which every delivery then shares.

use crate::config::EmailConfig;
use crate::error::{NotificationError, NotificationResult};
use crate::models::ProviderName;
use crate::providers::{EmailProvider, ResendProvider, SendGridProvider, SmtpProvider};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

type Build = fn(&EmailConfig) -> NotificationResult<Arc<dyn EmailProvider>>;

struct Candidate {
    name: ProviderName,
    is_configured: fn(&EmailConfig) -> bool,
    build: Build,
}

const CANDIDATES: [Candidate; 3] = [
    Candidate {
        name: ProviderName::Resend,
        is_configured: has_resend,
        build: build_resend,
    },
    Candidate {
        name: ProviderName::Sendgrid,
        is_configured: has_sendgrid,
        build: build_sendgrid,
    },
    Candidate {
        name: ProviderName::Smtp,
        is_configured: has_smtp,
        build: build_smtp,
    },
];

fn has_resend(config: &EmailConfig) -> bool {
    config.resend.is_some()
}

fn has_sendgrid(config: &EmailConfig) -> bool {
    config.sendgrid.is_some()
}

fn has_smtp(config: &EmailConfig) -> bool {
    config.smtp.is_some()
}

fn missing(name: ProviderName) -> NotificationError {
    NotificationError::Configuration(format!("{name} credentials are not configured"))
}

fn build_resend(config: &EmailConfig) -> NotificationResult<Arc<dyn EmailProvider>> {
    let resend = config.resend.clone().ok_or_else(|| missing(ProviderName::Resend))?;
    Ok(Arc::new(ResendProvider::new(resend, config.sender.clone())))
}

fn build_sendgrid(config: &EmailConfig) -> NotificationResult<Arc<dyn EmailProvider>> {
    let sendgrid = config.sendgrid.clone().ok_or_else(|| missing(ProviderName::Sendgrid))?;
    Ok(Arc::new(SendGridProvider::new(sendgrid, config.sender.clone())))
}

fn build_smtp(config: &EmailConfig) -> NotificationResult<Arc<dyn EmailProvider>> {
    let smtp = config.smtp.clone().ok_or_else(|| missing(ProviderName::Smtp))?;
    Ok(Arc::new(SmtpProvider::new(smtp, config.sender.clone())?))
}

/// Which providers could be used and which one is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub configured: Vec<ProviderName>,
    pub selected: Option<ProviderName>,
    #[serde(rename = "override")]
    pub provider_override: Option<ProviderName>,
}

/// The resolved adapter plus what resolution saw.
#[derive(Clone)]
pub struct ProviderRegistry {
    selected: Option<Arc<dyn EmailProvider>>,
    status: ProviderStatus,
}

impl ProviderRegistry {
    /// Resolve the adapter for `config`.
    ///
    /// An override wins only when its own credentials are present. Otherwise
    /// the first configured candidate in priority order is used. A candidate
    /// that fails to build is logged and skipped.
    pub fn resolve(config: &EmailConfig) -> Self {
        let configured: Vec<ProviderName> = CANDIDATES
            .iter()
            .filter(|c| (c.is_configured)(config))
            .map(|c| c.name)
            .collect();

        let preferred = config.provider_override.filter(|name| {
            let usable = configured.contains(name);
            if !usable {
                warn!(provider = %name, "EMAIL_PROVIDER names a provider without credentials, ignoring");
            }
            usable
        });

        let order = preferred
            .into_iter()
            .chain(configured.iter().copied().filter(|name| Some(*name) != preferred));

        let mut selected = None;
        for name in order {
            let Some(candidate) = CANDIDATES.iter().find(|c| c.name == name) else {
                continue;
            };
            match (candidate.build)(config) {
                Ok(provider) => {
                    selected = Some(provider);
                    break;
                }
                Err(e) => error!(provider = %name, error = %e, "Failed to build email provider"),
            }
        }

        let status = ProviderStatus {
            configured,
            selected: selected.as_ref().map(|p| p.name()),
            provider_override: config.provider_override,
        };

        match status.selected {
            Some(provider) => info!(%provider, configured = ?status.configured, "Email provider selected"),
            None => warn!("No email provider configured; deliveries will fail"),
        }

        Self { selected, status }
    }

    /// Registry around a ready-made adapter.
    pub fn with_provider(provider: Arc<dyn EmailProvider>) -> Self {
        let name = provider.name();
        Self {
            selected: Some(provider),
            status: ProviderStatus {
                configured: vec![name],
                selected: Some(name),
                provider_override: None,
            },
        }
    }

    /// Registry with nothing configured.
    pub fn empty() -> Self {
        Self {
            selected: None,
            status: ProviderStatus {
                configured: Vec::new(),
                selected: None,
                provider_override: None,
            },
        }
    }

    /// The resolved adapter, or a configuration error when there is none.
    pub fn provider(&self) -> NotificationResult<Arc<dyn EmailProvider>> {
        self.selected.clone().ok_or_else(|| {
            NotificationError::Configuration(
                "no email provider has a complete set of credentials".to_string(),
            )
        })
    }

    pub fn status(&self) -> &ProviderStatus {
        &self.status
    }
}
