//! Data models shared by the link builder and the dispatcher.

use serde::{Deserialize, Serialize};

/// Structured input for a prefilled compose surface.
///
/// `subject` and `body` are untrusted free text; they are only ever embedded
/// after passing through [`crate::sanitize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailParams {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl EmailParams {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn with_bcc(mut self, bcc: impl Into<String>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }
}

/// Every compose URI derived from one [`EmailParams`] and platform.
///
/// `mailto` always exists. The other variants are `None` when they do not
/// apply to the platform or could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLinks {
    pub mailto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gmail_web: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gmail_app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook: Option<String>,
}
