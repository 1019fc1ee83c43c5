//! Best-effort alerts for new submissions.
//!
//! Two independent channels, each optional:
//! - email to the configured recipients over SMTP (plain text + HTML)
//! - a signed JSON webhook
//!
//! Delivery happens on a detached task. Failures are logged and never reach
//! the vendor who submitted the form. There are no retries.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    config::Config,
    models::submission::{BusinessProfile, Submission},
};

type HmacSha256 = Hmac<Sha256>;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
const SENDER_NAME: &str = "Vendor Portal";
pub const SUBMISSION_CREATED: &str = "submission.created";

#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    #[error("failed to build email: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook endpoint answered {0}")]
    Rejected(reqwest::StatusCode),

    #[error("failed to serialize payload: {0}")]
    Payload(#[from] serde_json::Error),
}

struct EmailChannel {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

struct WebhookChannel {
    client: reqwest::Client,
    url: String,
    secret: String,
}

/// Fan-out point for submission alerts.
#[derive(Default)]
pub struct Notifier {
    email: Option<EmailChannel>,
    webhook: Option<WebhookChannel>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("email", &self.email.is_some())
            .field("webhook", &self.webhook.is_some())
            .finish()
    }
}

/// JSON body POSTed to the webhook.
///
/// ```json
/// {
///   "event": "submission.created",
///   "eventId": "…",
///   "id": "…",
///   "designerName": "Layla",
///   "brandName": "Sadu House",
///   "email": "layla@example.com",
///   "category": "crafts",
///   "formVariant": "stock",
///   "createdAt": "2025-06-01T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEvent<'a> {
    pub event: &'static str,
    pub event_id: Uuid,
    pub id: Uuid,
    pub designer_name: &'a str,
    pub brand_name: &'a str,
    pub email: &'a str,
    pub category: &'a str,
    pub form_variant: &'static str,
    pub created_at: DateTime<Utc>,
}

impl<'a> SubmissionEvent<'a> {
    pub fn new(event_id: Uuid, submission: &'a Submission) -> Self {
        Self {
            event: SUBMISSION_CREATED,
            event_id,
            id: submission.id,
            designer_name: &submission.designer_name,
            brand_name: &submission.brand_name,
            email: &submission.email,
            category: &submission.category,
            form_variant: submission.business.variant().as_str(),
            created_at: submission.created_at,
        }
    }
}

impl Notifier {
    /// A notifier with every channel switched off.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build the channels the configuration allows. Missing settings switch a
    /// channel off with a log line instead of failing startup.
    pub fn from_config(config: &Config) -> Self {
        Self {
            email: email_channel(config),
            webhook: webhook_channel(config),
        }
    }

    /// Send alerts for `submission` on a detached task and return immediately.
    pub fn dispatch(self: &Arc<Self>, submission: Submission) {
        if self.email.is_none() && self.webhook.is_none() {
            tracing::debug!(submission_id = %submission.id, "no notification channel configured");
            return;
        }

        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            notifier.notify(&submission).await;
        });
    }

    /// Deliver on every configured channel. Never fails; problems are logged.
    pub async fn notify(&self, submission: &Submission) {
        if let Some(email) = &self.email {
            match send_email(email, submission).await {
                Ok(()) => tracing::info!(
                    submission_id = %submission.id,
                    recipients = email.to.len(),
                    "notification email sent"
                ),
                Err(e) => tracing::error!(
                    submission_id = %submission.id,
                    error = %e,
                    "failed to send notification email"
                ),
            }
        }

        if let Some(webhook) = &self.webhook {
            match send_webhook(webhook, submission).await {
                Ok(event_id) => tracing::info!(
                    submission_id = %submission.id,
                    %event_id,
                    "webhook delivered"
                ),
                Err(e) => tracing::error!(
                    submission_id = %submission.id,
                    url = %webhook.url,
                    error = %e,
                    "failed to deliver webhook"
                ),
            }
        }
    }
}

fn email_channel(config: &Config) -> Option<EmailChannel> {
    let (Some(username), Some(password)) = (
        config.smtp_username.as_deref().filter(|s| !s.is_empty()),
        config.smtp_password.as_deref().filter(|s| !s.is_empty()),
    ) else {
        tracing::warn!("SMTP credentials not configured; notification emails disabled");
        return None;
    };

    let to: Vec<Mailbox> = config
        .notify_recipients
        .iter()
        .map(|address| address.trim())
        .filter(|address| !address.is_empty())
        .filter_map(|address| match address.parse::<Mailbox>() {
            Ok(mailbox) => Some(mailbox),
            Err(e) => {
                tracing::warn!(address, error = %e, "ignoring invalid notification recipient");
                None
            }
        })
        .collect();

    if to.is_empty() {
        tracing::warn!("NOTIFY_RECIPIENTS is empty; notification emails disabled");
        return None;
    }

    let from = match username.parse::<lettre::Address>() {
        Ok(address) => Mailbox::new(Some(SENDER_NAME.to_string()), address),
        Err(e) => {
            tracing::warn!(error = %e, "SMTP_USERNAME is not an email address; notification emails disabled");
            return None;
        }
    };

    let mailer = match AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host) {
        Ok(builder) => builder
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .timeout(Some(DELIVERY_TIMEOUT))
            .build(),
        Err(e) => {
            tracing::warn!(host = %config.smtp_host, error = %e, "invalid SMTP relay; notification emails disabled");
            return None;
        }
    };

    Some(EmailChannel { mailer, from, to })
}

fn webhook_channel(config: &Config) -> Option<WebhookChannel> {
    let url = config
        .notify_webhook_url
        .as_deref()
        .filter(|url| !url.is_empty())?;

    if let Err(reason) = validate_webhook_url(url) {
        tracing::warn!(url, reason, "webhook notifications disabled");
        return None;
    }

    let secret = match config.notify_webhook_secret.as_deref() {
        Some(secret) if !secret.is_empty() => secret.to_string(),
        _ => {
            let secret = generate_secret();
            tracing::warn!("NOTIFY_WEBHOOK_SECRET is not set; signing webhooks with a random secret");
            secret
        }
    };

    let client = match reqwest::Client::builder().timeout(DELIVERY_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build HTTP client; webhook notifications disabled");
            return None;
        }
    };

    Some(WebhookChannel {
        client,
        url: url.to_string(),
        secret,
    })
}

async fn send_email(channel: &EmailChannel, submission: &Submission) -> Result<(), DeliveryError> {
    let mut builder = Message::builder()
        .from(channel.from.clone())
        .subject(format!("New Vendor Submission: {}", submission.brand_name));
    for recipient in &channel.to {
        builder = builder.to(recipient.clone());
    }

    let message = builder.multipart(MultiPart::alternative_plain_html(
        render_text(submission),
        render_html(submission),
    ))?;

    channel.mailer.send(message).await?;
    Ok(())
}

/// POST the signed event. Returns the event id on a 2xx answer.
///
/// # Headers Sent
///
/// - `Content-Type: application/json`
/// - `X-Webhook-Signature: sha256=<hex>`
/// - `X-Webhook-Event-Id: <uuid>`
async fn send_webhook(
    channel: &WebhookChannel,
    submission: &Submission,
) -> Result<Uuid, DeliveryError> {
    let event_id = Uuid::new_v4();
    let payload = serde_json::to_string(&SubmissionEvent::new(event_id, submission))?;
    let signature = generate_signature(&channel.secret, &payload);

    let response = channel
        .client
        .post(&channel.url)
        .header("Content-Type", "application/json")
        .header("X-Webhook-Signature", signature)
        .header("X-Webhook-Event-Id", event_id.to_string())
        .body(payload)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        Ok(event_id)
    } else {
        Err(DeliveryError::Rejected(status))
    }
}

/// Label/value pairs shown in both email bodies.
fn summary_lines(submission: &Submission) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("Designer Name", submission.designer_name.clone()),
        ("Brand Name", submission.brand_name.clone()),
        ("Email", submission.email.clone()),
        ("Phone", submission.phone_number.clone()),
        ("City", submission.city.clone()),
        ("Category", submission.category.clone()),
        ("Fulfillment Method", submission.fulfillment_method.clone()),
    ];

    match &submission.business {
        BusinessProfile::Stock {
            stock_availability,
            branch_count,
        } => {
            lines.push(("Stock Availability", stock_availability.clone()));
            lines.push(("Branch Count", branch_count.to_string()));
        }
        BusinessProfile::Policy(_) => {
            lines.push(("Policies", "All accepted".to_string()));
        }
    }

    if let Some(link) = &submission.store_link {
        lines.push(("Store Link", link.clone()));
    }
    lines
}

fn render_text(submission: &Submission) -> String {
    let mut body = String::from("New Vendor Submission\n\n");
    for (label, value) in summary_lines(submission) {
        body.push_str(&format!("{label}: {value}\n"));
    }
    body.push_str(&format!("\nSubmission ID: {}\n", submission.id));
    body
}

fn render_html(submission: &Submission) -> String {
    let rows: String = summary_lines(submission)
        .into_iter()
        .map(|(label, value)| {
            format!(
                "<tr><th align=\"left\">{label}</th><td>{}</td></tr>",
                escape_html(&value)
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head><body>\
         <h1>New Vendor Submission</h1>\
         <table cellpadding=\"4\">{rows}</table>\
         <p>Submission ID: {}</p>\
         </body></html>",
        submission.id
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// HMAC-SHA256 signature in the `sha256=<hex>` form.
///
/// Receivers recompute HMAC-SHA256(secret, raw body) and compare in constant time.
pub fn generate_signature(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC key length is valid");
    mac.update(payload.as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// 64 hex characters (32 random bytes).
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// HTTPS anywhere, plain HTTP only for local development hosts.
pub fn validate_webhook_url(url: &str) -> Result<(), &'static str> {
    if url.len() > 2048 {
        return Err("URL exceeds 2048 characters");
    }

    let parsed = url::Url::parse(url).map_err(|_| "Invalid URL format")?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => match parsed.host_str() {
            Some("localhost" | "127.0.0.1" | "0.0.0.0") => Ok(()),
            _ => Err("HTTP is only allowed for localhost. Use HTTPS for production."),
        },
        _ => Err("URL must use HTTP or HTTPS"),
    }
}
