//! Contact form relay.
//!
//! Submissions are validated and forwarded to a form relay service
//! (formsubmit.co by default), which turns a JSON POST into an email to the
//! site owner.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default relay service.
pub const DEFAULT_RELAY_BASE_URL: &str = "https://formsubmit.co";

/// Contact form submission.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Contact relay failures.
///
/// The `Display` text of each variant is what the visitor sees.
#[derive(Debug, Error)]
pub enum ContactError {
    /// One of the fields is blank.
    #[error("Missing required fields")]
    MissingFields,
    /// The email address is not plausible.
    #[error("Invalid email address")]
    InvalidEmail,
    /// The relay rejected the submission with an explanation.
    #[error("{0}")]
    Rejected(String),
    /// The relay answered with a JSON error that carries no explanation.
    #[error("Something went wrong. Please try again later.")]
    Failed {
        /// HTTP status from the relay.
        status: u16,
    },
    /// The relay answered with an error that is not JSON.
    #[error("Unexpected response from server.")]
    UnexpectedResponse {
        /// HTTP status from the relay.
        status: u16,
    },
    /// The relay could not be reached.
    #[error("Failed to connect to the server. Please verify your connection.")]
    Transport(#[from] reqwest::Error),
    /// The relay URL could not be built.
    #[error("Contact form is not configured.")]
    InvalidUrl(#[from] url::ParseError),
}

impl ContactError {
    /// Whether the visitor caused the error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingFields | Self::InvalidEmail)
    }
}

impl ContactForm {
    /// Trim every field and check that the submission is complete.
    pub fn validated(self) -> Result<Self, ContactError> {
        let form = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        };

        if form.name.is_empty() || form.email.is_empty() || form.message.is_empty() {
            return Err(ContactError::MissingFields);
        }
        if !is_plausible_email(&form.email) {
            return Err(ContactError::InvalidEmail);
        }
        Ok(form)
    }

    /// Email subject line for this submission.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("New Message from {} (Portfolio)", self.name)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// JSON body sent to the relay.
#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    #[serde(rename = "_subject")]
    subject: String,
    #[serde(rename = "_template")]
    template: &'static str,
}

/// Client for the form relay service.
#[derive(Debug, Clone)]
pub struct ContactRelay {
    http: reqwest::Client,
    endpoint: Url,
}

impl ContactRelay {
    /// Create a relay that delivers to `recipient`.
    pub fn new(http: reqwest::Client, base_url: &str, recipient: &str) -> Result<Self, ContactError> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let endpoint = base.join(&format!("ajax/{recipient}"))?;
        Ok(Self { http, endpoint })
    }

    /// Relay endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Validate and forward a submission.
    pub async fn send(&self, form: ContactForm) -> Result<(), ContactError> {
        let form = form.validated()?;
        let payload = RelayPayload {
            name: &form.name,
            email: &form.email,
            message: &form.message,
            subject: form.subject(),
            template: "table",
        };

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::info!(name: "contact.relayed", status = status.as_u16(), "Contact form relayed");
            return Ok(());
        }

        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));

        let status = status.as_u16();
        let error = if is_json {
            resp.json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(ToString::to_string))
                .filter(|m| !m.trim().is_empty())
                .map_or(ContactError::Failed { status }, ContactError::Rejected)
        } else {
            ContactError::UnexpectedResponse { status }
        };

        tracing::warn!(
            name: "contact.rejected",
            status,
            error = %error,
            "Form relay rejected submission"
        );

        Err(error)
    }
}
