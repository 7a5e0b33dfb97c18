//! Email template rendering.
//!
//! Handlebars renders the HTML form with every interpolated value passed
//! through [`escape_html`]; the plain-text form is derived from that HTML so
//! the two can never disagree.

mod text;

pub use text::html_to_text;

use crate::error::NotificationResult;
use crate::models::{ChangeRequestContext, ParentMessage};
use chrono::{DateTime, Utc};
use domain_compose::sanitize::escape_html;
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const CHANGE_REQUEST: &str = "change_request";
const PARENT_MESSAGE: &str = "parent_message";

/// Rendered email content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeRequestView<'a> {
    #[serde(flatten)]
    request: &'a ChangeRequestContext,
    submitted_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParentMessageView<'a> {
    #[serde(flatten)]
    message: &'a ParentMessage,
    submitted_at: String,
}

/// Renders the notification templates. Cheap to clone.
#[derive(Clone)]
pub struct TemplateRenderer {
    handlebars: Arc<Handlebars<'static>>,
}

impl TemplateRenderer {
    /// Create a renderer with all templates registered.
    pub fn new() -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(escape_html);
        handlebars.register_template_string(CHANGE_REQUEST, CHANGE_REQUEST_HTML_TEMPLATE)?;
        handlebars.register_template_string(PARENT_MESSAGE, PARENT_MESSAGE_HTML_TEMPLATE)?;

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    fn render<T: Serialize>(&self, template: &str, subject: String, data: &T) -> NotificationResult<RenderedEmail> {
        let html = self.handlebars.render(template, data)?;
        let text = html_to_text(&html);
        Ok(RenderedEmail {
            subject: single_line(&subject),
            html,
            text,
        })
    }

    /// Render a schedule change request, stamped with the current time.
    pub fn render_change_request(&self, request: &ChangeRequestContext) -> NotificationResult<RenderedEmail> {
        self.render_change_request_at(request, Utc::now())
    }

    pub fn render_change_request_at(
        &self,
        request: &ChangeRequestContext,
        submitted_at: DateTime<Utc>,
    ) -> NotificationResult<RenderedEmail> {
        debug!(student = %request.student_name, "Rendering change request email");

        let view = ChangeRequestView {
            request,
            submitted_at: format_timestamp(submitted_at),
        };
        self.render(
            CHANGE_REQUEST,
            format!("Schedule Change Request – {}", request.student_name),
            &view,
        )
    }

    /// Render a free-form parent message, stamped with the current time.
    pub fn render_parent_message(&self, message: &ParentMessage) -> NotificationResult<RenderedEmail> {
        self.render_parent_message_at(message, Utc::now())
    }

    pub fn render_parent_message_at(
        &self,
        message: &ParentMessage,
        submitted_at: DateTime<Utc>,
    ) -> NotificationResult<RenderedEmail> {
        debug!(student = %message.student_name, "Rendering parent message email");

        let view = ParentMessageView {
            message,
            submitted_at: format_timestamp(submitted_at),
        };
        self.render(
            PARENT_MESSAGE,
            format!(
                "Message from {} regarding {}",
                message.parent_name, message.student_name
            ),
            &view,
        )
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y at %-I:%M %p UTC").to_string()
}

/// Header values must not contain line breaks.
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Email Templates
// ============================================================================

const CHANGE_REQUEST_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Schedule Change Request</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 32px;">
        <h1 style="color: #18181b; font-size: 22px; margin: 0 0 16px 0;">Schedule Change Request</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0;">
          {{parentName}} has requested a schedule change for {{studentName}}.
        </p>
        <table width="100%" cellspacing="0" cellpadding="6" style="font-size: 15px; color: #27272a;">
          <tr><th align="left">Student:</th><td>{{studentName}}{{#if studentId}} (ID {{studentId}}){{/if}}</td></tr>
          <tr><th align="left">Current schedule:</th><td>{{currentSchedule}}</td></tr>
          <tr><th align="left">Requested change:</th><td>{{requestedChange}}</td></tr>
          <tr><th align="left">Effective date:</th><td>{{effectiveDate}}</td></tr>
          <tr><th align="left">Reason:</th><td style="white-space: pre-wrap;">{{reason}}</td></tr>
          {{#if additionalNotes}}
          <tr><th align="left">Additional notes:</th><td style="white-space: pre-wrap;">{{additionalNotes}}</td></tr>
          {{/if}}
        </table>
        <h2 style="color: #18181b; font-size: 18px; margin: 24px 0 8px 0;">Parent contact</h2>
        <p style="color: #52525b; font-size: 15px; line-height: 22px; margin: 0;">
          {{parentName}}<br>
          <a href="mailto:{{parentEmail}}">{{parentEmail}}</a>{{#if parentPhone}}<br>
          {{parentPhone}}{{/if}}
        </p>
        <p style="color: #a1a1aa; font-size: 13px; margin: 24px 0 0 0;">Submitted {{submittedAt}}</p>
      </td>
    </tr>
  </table>
</body>
</html>
"#;

const PARENT_MESSAGE_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Message from a parent</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 32px;">
        <h1 style="color: #18181b; font-size: 22px; margin: 0 0 16px 0;">Message from {{parentName}}</h1>
        <p style="color: #52525b; font-size: 15px; margin: 0 0 16px 0;">Regarding: {{studentName}}</p>
        <p style="color: #27272a; font-size: 16px; line-height: 24px; margin: 0; white-space: pre-wrap;">{{message}}</p>
        <p style="color: #a1a1aa; font-size: 13px; margin: 24px 0 0 0;">Sent {{submittedAt}}</p>
      </td>
    </tr>
  </table>
</body>
</html>
"#;
