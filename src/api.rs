//! Wire layer for the licensing and update endpoints.
//!
//! Both endpoints accept URL-encoded form POSTs and answer with JSON. The
//! transport is abstracted behind [`ApiTransport`] so the clients can be
//! exercised against scripted replies; [`HttpTransport`] is the reqwest-backed
//! implementation used in production.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{UpdaterError, UpdaterResult};
use crate::license::LicenseStatus;

/// Hard timeout for every outbound call. There is no retry loop; a failed
/// update check is retried passively through cache expiry.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Raw reply from the wire, before schema validation.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Outbound HTTP collaborator.
///
/// Implementations post `fields` as an URL-encoded form body and report
/// connection-level failures as [`UpdaterError::Transport`]. Status-code and
/// body-shape checks happen above this trait.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> UpdaterResult<HttpReply>;
}

/// Production transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the standard 15 second timeout.
    ///
    /// `verify_ssl` maps to certificate verification; hosts behind broken
    /// proxies disable it through the config policy toggle.
    pub fn new(verify_ssl: bool) -> UpdaterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> UpdaterResult<HttpReply> {
        let response = self.client.post(url).form(fields).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

// === Response Schemas ===

/// The `expires` field of a license response: either the literal string
/// `"lifetime"` or an absolute date.
///
/// The date is kept verbatim and only parsed when formatted for display, so
/// an unrecognized format degrades to showing the raw value rather than
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    Lifetime,
    Date(String),
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == "lifetime" {
            Ok(Expiry::Lifetime)
        } else {
            Ok(Expiry::Date(raw))
        }
    }
}

impl Expiry {
    /// Human-readable expiry date, e.g. "November 20, 2026".
    ///
    /// Returns `None` for lifetime licenses. The field is parsed as an
    /// absolute date; the current request time plays no part in it.
    pub fn display_date(&self) -> Option<String> {
        match self {
            Expiry::Lifetime => None,
            Expiry::Date(raw) => Some(format_expiry_date(raw)),
        }
    }

    pub fn is_lifetime(&self) -> bool {
        matches!(self, Expiry::Lifetime)
    }
}

/// Format a wire date for status messages. Accepts the date-only, SQL
/// datetime and RFC 3339 shapes the API has been seen to emit; anything else
/// is shown verbatim.
fn format_expiry_date(raw: &str) -> String {
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()));

    match parsed {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Licensing endpoint response (`activate`, `deactivate`, `info`).
///
/// Every field except `success` is optional on the wire; a body that is not a
/// JSON object at all maps to [`UpdaterError::MalformedResponse`] at the call
/// site instead.
#[derive(Debug, Clone, Deserialize)]
pub struct LicenseResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub license_status: Option<LicenseStatus>,
    /// Error-code to detail mapping; only the first key drives messaging.
    #[serde(default)]
    pub errors: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub expires: Option<Expiry>,
    #[serde(default)]
    pub site_count: Option<u32>,
    /// 0 means unlimited.
    #[serde(default)]
    pub license_limit: Option<u32>,
}

impl LicenseResponse {
    /// First key of the `errors` mapping, the one the message table is
    /// keyed by.
    pub fn first_error_code(&self) -> Option<&str> {
        self.errors.keys().next().map(String::as_str)
    }

    /// Fold `success: false` into the error taxonomy, keeping the pieces the
    /// message mapping needs.
    pub fn require_success(self) -> UpdaterResult<Self> {
        if self.success {
            Ok(self)
        } else {
            let code = self.first_error_code().unwrap_or("unknown").to_string();
            Err(UpdaterError::ApiLogic {
                code,
                expires: self.expires,
            })
        }
    }
}

/// Update endpoint response (`get_version`).
///
/// `sections` arrives either as an inline object or as a string holding a
/// serialized object (the API nests it); both forms decode into the same
/// mapping. Fields this client does not interpret are preserved in `extra`
/// so the host updater receives the complete record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub new_version: String,
    #[serde(default, deserialize_with = "deserialize_sections")]
    pub sections: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VersionResponse {
    /// Record cached after a failed check. `new_version` equals the
    /// installed version so the comparison naturally reports "no update".
    pub fn fallback(installed_version: &str) -> Self {
        Self {
            new_version: installed_version.to_string(),
            sections: None,
            url: None,
            package: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Changelog section, when the API provided one.
    pub fn changelog(&self) -> Option<&str> {
        self.sections
            .as_ref()
            .and_then(|sections| sections.get("changelog"))
            .map(String::as_str)
    }
}

fn deserialize_sections<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(unnest_sections))
}

/// Decode the nested `sections` value, whichever of its two wire forms it
/// arrived in. Shapes that fit neither are dropped rather than failing the
/// whole response.
fn unnest_sections(value: serde_json::Value) -> Option<BTreeMap<String, String>> {
    match value {
        serde_json::Value::String(raw) => serde_json::from_str(&raw).ok(),
        other => serde_json::from_value(other).ok(),
    }
}
