//! Mock email provider for testing

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use crate::models::ProviderName;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Scripted result for one `send` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Accept,
    Transient,
    Permanent,
}

/// Mock provider that captures accepted emails and replays a script of outcomes.
///
/// Once the script runs out every call is accepted.
#[derive(Clone)]
pub struct MockProvider {
    name: ProviderName,
    script: Arc<Mutex<VecDeque<MockOutcome>>>,
    sent_emails: Arc<Mutex<Vec<EmailContent>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockProvider {
    pub fn new(name: ProviderName) -> Self {
        Self {
            name,
            script: Arc::new(Mutex::new(VecDeque::new())),
            sent_emails: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_script(self, outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            ..self
        }
    }

    /// Get all accepted emails
    pub async fn sent_emails(&self) -> Vec<EmailContent> {
        self.sent_emails.lock().await.clone()
    }

    /// Number of `send` calls, accepted or not.
    pub async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }

    /// Check if an email was sent to a specific address
    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.sent_emails
            .lock()
            .await
            .iter()
            .any(|e| e.to_email == email)
    }
}

#[async_trait]
impl EmailProvider for MockProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        let call = {
            let mut calls = self.calls.lock().await;
            *calls += 1;
            *calls
        };

        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or(MockOutcome::Accept);

        match outcome {
            MockOutcome::Accept => {
                self.sent_emails.lock().await.push(email.clone());
                Ok(SentEmail {
                    message_id: Some(format!("mock-{call}")),
                })
            }
            MockOutcome::Transient => Err(NotificationError::transient(self.name, "mock outage")),
            MockOutcome::Permanent => Err(NotificationError::permanent(self.name, "mock rejection")),
        }
    }

    fn name(&self) -> ProviderName {
        self.name
    }
}
