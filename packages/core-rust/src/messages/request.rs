//! Inbound action envelope.
//!
//! The wire shape carries a string `action` discriminator next to three
//! optional payload objects. Only the payload selected by `action` is read;
//! the others are ignored.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

// ---------------------------------------------------------------------------
// ActionTag
// ---------------------------------------------------------------------------

/// Discriminator selecting which backend a dispatch targets.
///
/// Unrecognized strings are kept as [`ActionTag::Unknown`] instead of failing
/// deserialization, so the dispatcher can answer them with `UnknownAction`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionTag {
    Auth,
    Log,
    Mail,
    Unknown(String),
}

impl ActionTag {
    /// Returns the wire spelling of the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Auth => "auth",
            Self::Log => "log",
            Self::Mail => "mail",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ActionTag {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "auth" => Self::Auth,
            "log" => Self::Log,
            "mail" => Self::Mail,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for ActionTag {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<ActionTag> for String {
    fn from(tag: ActionTag) -> Self {
        match tag {
            ActionTag::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Credentials forwarded to the authentication backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthPayload {
    pub email: String,
    pub password: String,
}

impl AuthPayload {
    /// Checks that both fields are present. Anything beyond non-emptiness is
    /// the authentication backend's decision.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::BadRequest` naming the first empty field.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.email.is_empty() {
            return Err(DispatchError::BadRequest("email is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(DispatchError::BadRequest(
                "password is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A named log line for the logging backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPayload {
    pub name: String,
    pub data: String,
}

/// A message handed to the mail backend for SMTP delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailPayload {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// ActionRequest
// ---------------------------------------------------------------------------

/// The tagged request envelope accepted by the dispatcher.
///
/// `action` is required; the payload fields are optional on the wire. Only
/// the payload named by `action` is decoded, so a malformed sibling never
/// fails the request. A known tag whose payload is absent is rejected by the
/// dispatcher, not here. Missing fields inside the selected payload decode as
/// empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireRequest")]
pub struct ActionRequest {
    pub action: ActionTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailPayload>,
}

impl ActionRequest {
    /// Builds an `auth` request.
    #[must_use]
    pub fn auth(payload: AuthPayload) -> Self {
        Self {
            action: ActionTag::Auth,
            auth: Some(payload),
            log: None,
            mail: None,
        }
    }

    /// Builds a `log` request.
    #[must_use]
    pub fn log(payload: LogPayload) -> Self {
        Self {
            action: ActionTag::Log,
            auth: None,
            log: Some(payload),
            mail: None,
        }
    }

    /// Builds a `mail` request.
    #[must_use]
    pub fn mail(payload: MailPayload) -> Self {
        Self {
            action: ActionTag::Mail,
            auth: None,
            log: None,
            mail: Some(payload),
        }
    }
}

/// Undecoded form of [`ActionRequest`]: payloads stay raw JSON until the tag
/// has picked one.
#[derive(Deserialize)]
struct WireRequest {
    action: ActionTag,
    #[serde(default)]
    auth: Option<Value>,
    #[serde(default)]
    log: Option<Value>,
    #[serde(default)]
    mail: Option<Value>,
}

impl TryFrom<WireRequest> for ActionRequest {
    type Error = serde_json::Error;

    fn try_from(wire: WireRequest) -> Result<Self, Self::Error> {
        let mut req = Self {
            action: wire.action,
            auth: None,
            log: None,
            mail: None,
        };
        match req.action {
            ActionTag::Auth => req.auth = selected(wire.auth)?,
            ActionTag::Log => req.log = selected(wire.log)?,
            ActionTag::Mail => req.mail = selected(wire.mail)?,
            ActionTag::Unknown(_) => {}
        }
        Ok(req)
    }
}

fn selected<T: DeserializeOwned>(raw: Option<Value>) -> Result<Option<T>, serde_json::Error> {
    raw.map(serde_json::from_value).transpose()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
