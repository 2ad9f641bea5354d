//! Resend email adapter.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{BookingConfirmation, NotificationSender};

const DEFAULT_API_URL: &str = "https://api.resend.com/emails";

#[derive(Clone)]
pub struct ResendConfig {
    api_key: SecretString,
    /// `"Name <address>"` header value.
    from: String,
    api_url: String,
}

impl ResendConfig {
    pub fn new(api_key: SecretString, from: impl Into<String>) -> Self {
        Self {
            api_key,
            from: from.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
}

pub struct ResendNotificationSender {
    config: ResendConfig,
    http_client: reqwest::Client,
}

impl ResendNotificationSender {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationSender for ResendNotificationSender {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> Result<(), DomainError> {
        let (subject, html) = render_booking_confirmation(confirmation);
        let body = SendEmailRequest {
            from: &self.config.from,
            to: vec![confirmation.recipient.as_str()],
            subject,
            html,
        };

        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::new(ErrorCode::NotificationError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DomainError::new(
                ErrorCode::NotificationError,
                format!("Resend API error ({}): {}", status, text),
            ));
        }

        tracing::info!(booking_id = %confirmation.booking_id, "Booking confirmation email sent");
        Ok(())
    }
}

/// Subject line and HTML body for a booking confirmation.
pub fn render_booking_confirmation(confirmation: &BookingConfirmation) -> (String, String) {
    let subject = format!("Your {} is confirmed", confirmation.session_type_name);
    let greeting = match &confirmation.contact_name {
        Some(name) => format!("Hi {},", escape_html(name)),
        None => "Hi,".to_string(),
    };
    let when = match &confirmation.scheduled_at {
        Some(at) => format!(
            "<p>Scheduled for: {}</p>",
            at.as_datetime().format("%A %d %B %Y, %H:%M UTC")
        ),
        None => "<p>We will be in touch shortly to schedule your session.</p>".to_string(),
    };

    let html = format!(
        "<p>{}</p>\
         <p>Thanks for booking a {} ({} minutes).</p>\
         {}\
         <p>Amount paid: {}</p>\
         <p>Booking reference: {}</p>",
        greeting,
        escape_html(&confirmation.session_type_name),
        confirmation.duration_minutes,
        when,
        confirmation.amount_paid,
        confirmation.booking_id,
    );

    (subject, html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
