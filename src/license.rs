//! License client: activation, deactivation and status display.
//!
//! All three operations are one outbound POST each, with the result folded
//! into durable state (`<slug>_license_key_status`) and a cached status
//! message (`<slug>_license_message`, 24 h). Nothing here panics or returns
//! an error to the caller; every public operation yields a renderable
//! outcome.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::{ApiTransport, Expiry, LicenseResponse};
use crate::config::UpdaterConfig;
use crate::errors::{UpdaterError, UpdaterResult};
use crate::store::{OptionStore, TransientStore};
use crate::strings::UpdaterStrings;

/// Post-processing hook for license error messages. Receives the mapped
/// message and the raw error code; returns the message to surface.
pub type MessageFilter = dyn Fn(String, &str) -> String + Send + Sync;

/// Last known license status, as reported by the API.
///
/// Only ever set from a successful API response; `Unknown` doubles as the
/// forward-compatibility bucket for statuses this client does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Valid,
    Invalid,
    Expired,
    Inactive,
    Disabled,
    SiteInactive,
    #[serde(other)]
    Unknown,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Valid => "valid",
            LicenseStatus::Invalid => "invalid",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Inactive => "inactive",
            LicenseStatus::Disabled => "disabled",
            LicenseStatus::SiteInactive => "site_inactive",
            LicenseStatus::Unknown => "unknown",
        }
    }

    /// Parse the stored option value. Anything unrecognized reads as
    /// `Unknown` rather than failing.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "valid" => LicenseStatus::Valid,
            "invalid" => LicenseStatus::Invalid,
            "expired" => LicenseStatus::Expired,
            "inactive" => LicenseStatus::Inactive,
            "disabled" => LicenseStatus::Disabled,
            "site_inactive" => LicenseStatus::SiteInactive,
            _ => LicenseStatus::Unknown,
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of an activate/deactivate action: the payload the host renders
/// after redirecting back to its settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    pub success: bool,
    /// Renderable error-banner message; `None` on success.
    pub message: Option<String>,
}

impl ActivationOutcome {
    fn succeeded() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
        }
    }
}

/// Client for the remote licensing endpoint.
///
/// Collaborators are injected: the transport performs the outbound POSTs,
/// the option store holds durable state, the transient store the cached
/// status message.
pub struct LicenseClient {
    config: UpdaterConfig,
    strings: UpdaterStrings,
    transport: Arc<dyn ApiTransport>,
    options: Arc<dyn OptionStore>,
    transients: Arc<dyn TransientStore>,
    message_filter: Option<Box<MessageFilter>>,
}

impl LicenseClient {
    pub fn new(
        config: UpdaterConfig,
        strings: UpdaterStrings,
        transport: Arc<dyn ApiTransport>,
        options: Arc<dyn OptionStore>,
        transients: Arc<dyn TransientStore>,
    ) -> Self {
        Self {
            config,
            strings,
            transport,
            options,
            transients,
            message_filter: None,
        }
    }

    /// Extension hook: post-process mapped error messages. Pure function
    /// over (message, error code).
    pub fn with_message_filter(
        mut self,
        filter: impl Fn(String, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.message_filter = Some(Box::new(filter));
        self
    }

    // === Durable State ===

    /// Stored license key, trimmed; `None` when unset or blank.
    pub fn license_key(&self) -> Option<String> {
        self.options
            .get(&self.config.license_key_option())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Last known status; `Unknown` when nothing is stored.
    pub fn status(&self) -> LicenseStatus {
        self.options
            .get(&self.config.status_option())
            .map(|raw| LicenseStatus::parse(&raw))
            .unwrap_or(LicenseStatus::Unknown)
    }

    /// Persist a newly entered license key.
    ///
    /// A key different from the stored one invalidates the durable status
    /// and the cached status message, forcing a fresh check.
    pub fn set_license_key(&self, new_key: &str) {
        let key_option = self.config.license_key_option();
        if let Some(old) = self.options.get(&key_option) {
            if old.trim() != new_key.trim() {
                tracing::debug!(slug = %self.config.slug(), "license key changed; clearing status");
                self.options.delete(&self.config.status_option());
                self.transients.delete(&self.config.message_transient());
            }
        }
        self.options.set(&key_option, new_key.trim());
    }

    // === Operations ===

    /// Activate the stored license key against the licensing endpoint.
    pub async fn activate(&self) -> ActivationOutcome {
        match self
            .send("activate")
            .await
            .and_then(LicenseResponse::require_success)
        {
            Ok(response) => {
                if let Some(status) = response.license_status {
                    self.options.set(&self.config.status_option(), status.as_str());
                }
                self.transients.delete(&self.config.message_transient());
                ActivationOutcome::succeeded()
            }
            Err(UpdaterError::ApiLogic { code, expires }) => {
                ActivationOutcome::failed(self.map_error_code(&code, expires.as_ref()))
            }
            Err(err) => {
                tracing::warn!(error = %err, "license activation request failed");
                ActivationOutcome::failed(self.strings.try_again.clone())
            }
        }
    }

    /// Deactivate the stored license key. Success clears the durable status
    /// entirely, reverting it to `Unknown`.
    pub async fn deactivate(&self) -> ActivationOutcome {
        match self
            .send("deactivate")
            .await
            .and_then(LicenseResponse::require_success)
        {
            Ok(_) => {
                self.options.delete(&self.config.status_option());
                self.transients.delete(&self.config.message_transient());
                ActivationOutcome::succeeded()
            }
            Err(UpdaterError::ApiLogic { code, expires }) => {
                ActivationOutcome::failed(self.map_error_code(&code, expires.as_ref()))
            }
            Err(err) => {
                tracing::warn!(error = %err, "license deactivation request failed");
                ActivationOutcome::failed(self.strings.try_again.clone())
            }
        }
    }

    /// Status message for display on the settings screen.
    ///
    /// Served from the 24 h message transient when fresh; otherwise issues
    /// an `info` call, updates the durable status as a side effect, and
    /// caches the composed message.
    pub async fn check_status(&self) -> String {
        if self.license_key().is_none() {
            return self.strings.enter_key.clone();
        }

        let transient_key = self.config.message_transient();
        if let Some(cached) = self.transients.get(&transient_key) {
            tracing::debug!(key = %transient_key, "license message served from cache");
            return cached;
        }

        let message = self.fetch_status_message().await;
        self.transients
            .set(&transient_key, &message, Duration::hours(24));
        message
    }

    async fn fetch_status_message(&self) -> String {
        let response = match self.send("info").await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "license info request failed");
                return self.strings.license_status_unknown.clone();
            }
        };

        // A body without license data still parses; report unknown.
        let Some(status) = response.license_status else {
            return self.strings.license_status_unknown.clone();
        };

        self.options.set(&self.config.status_option(), status.as_str());

        match status {
            LicenseStatus::Valid => self.compose_active_message(&response),
            LicenseStatus::Invalid => self.map_error_code(
                response.first_error_code().unwrap_or("unknown"),
                response.expires.as_ref(),
            ),
            _ => self.strings.license_status_unknown.clone(),
        }
    }

    fn compose_active_message(&self, response: &LicenseResponse) -> String {
        let mut message = self.strings.license_key_is_active.clone();

        match &response.expires {
            Some(Expiry::Lifetime) => {
                message.push(' ');
                message.push_str(&self.strings.expires_never);
            }
            Some(expiry @ Expiry::Date(_)) => {
                if let Some(date) = expiry.display_date() {
                    message.push(' ');
                    message.push_str(&self.strings.expires_on(&date));
                }
            }
            None => {}
        }

        let site_count = response.site_count.unwrap_or(0);
        if site_count > 0 {
            let limit = match response.license_limit {
                Some(0) | None => self.strings.unlimited.clone(),
                Some(n) => n.to_string(),
            };
            message.push(' ');
            message.push_str(&self.strings.sites_summary(site_count, &limit));
        }

        message
    }

    /// Fixed error-code to message table, keyed by the first key of the
    /// response's `errors` mapping. Unknown codes fall back to the generic
    /// message; the optional filter hook post-processes the result.
    fn map_error_code(&self, code: &str, expires: Option<&Expiry>) -> String {
        let message = match code {
            "missing_license_key" => "License key does not exist".to_string(),
            "expired_license_key" => {
                let date = expires
                    .and_then(Expiry::display_date)
                    .unwrap_or_else(|| "an earlier date".to_string());
                format!("Your license key expired on {}.", date)
            }
            "unregistered_license_domain" => "Unregistered domain address".to_string(),
            "invalid_license_or_domain" => "Invalid license or url".to_string(),
            "can_not_add_new_domain" => "Can not add a new domain.".to_string(),
            _ => self.strings.try_again.clone(),
        };

        match &self.message_filter {
            Some(filter) => filter(message, code),
            None => message,
        }
    }

    async fn send(&self, action: &str) -> UpdaterResult<LicenseResponse> {
        let fields = vec![
            ("action".to_string(), action.to_string()),
            (
                "license_key".to_string(),
                self.license_key().unwrap_or_default(),
            ),
            ("license_url".to_string(), self.config.license_url.clone()),
            ("download_tag".to_string(), self.config.download_tag.clone()),
        ];

        let reply = self
            .transport
            .post_form(&self.config.license_api_url, &fields)
            .await?;

        if reply.status != 200 {
            return Err(UpdaterError::HttpStatus {
                status: reply.status,
            });
        }

        serde_json::from_str(&reply.body)
            .map_err(|err| UpdaterError::MalformedResponse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpReply;
    use crate::store::{MemoryOptionStore, MemoryTransientStore};
    use async_trait::async_trait;

    /// Transport that should never be reached.
    struct NullTransport;

    #[async_trait]
    impl ApiTransport for NullTransport {
        async fn post_form(
            &self,
            _url: &str,
            _fields: &[(String, String)],
        ) -> UpdaterResult<HttpReply> {
            panic!("no network call expected");
        }
    }

    fn offline_client() -> LicenseClient {
        LicenseClient::new(
            UpdaterConfig {
                theme_slug: "aurora".to_string(),
                ..UpdaterConfig::default()
            },
            UpdaterStrings::default(),
            Arc::new(NullTransport),
            Arc::new(MemoryOptionStore::new()),
            Arc::new(MemoryTransientStore::new()),
        )
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            LicenseStatus::Valid,
            LicenseStatus::Invalid,
            LicenseStatus::Expired,
            LicenseStatus::Inactive,
            LicenseStatus::Disabled,
            LicenseStatus::SiteInactive,
        ] {
            assert_eq!(LicenseStatus::parse(status.as_str()), status);
        }
        assert_eq!(LicenseStatus::parse("whatever"), LicenseStatus::Unknown);
    }

    #[test]
    fn error_table_maps_the_five_known_codes() {
        let client = offline_client();

        assert_eq!(
            client.map_error_code("missing_license_key", None),
            "License key does not exist"
        );
        assert_eq!(
            client.map_error_code(
                "expired_license_key",
                Some(&Expiry::Date("2024-06-01".to_string()))
            ),
            "Your license key expired on June 1, 2024."
        );
        assert_eq!(
            client.map_error_code("unregistered_license_domain", None),
            "Unregistered domain address"
        );
        assert_eq!(
            client.map_error_code("invalid_license_or_domain", None),
            "Invalid license or url"
        );
        assert_eq!(
            client.map_error_code("can_not_add_new_domain", None),
            "Can not add a new domain."
        );
    }

    #[test]
    fn unmapped_codes_fall_back_to_generic() {
        let client = offline_client();
        let generic = "An error occurred, please try again.";

        assert_eq!(client.map_error_code("unknown", None), generic);
        assert_eq!(client.map_error_code("some_future_code", None), generic);
        assert_eq!(client.map_error_code("", None), generic);
    }

    #[test]
    fn expired_code_without_date_still_renders() {
        let client = offline_client();
        assert_eq!(
            client.map_error_code("expired_license_key", None),
            "Your license key expired on an earlier date."
        );
    }

    #[test]
    fn message_filter_post_processes_the_mapping() {
        let client = offline_client().with_message_filter(|message, code| {
            format!("[{code}] {message}")
        });

        assert_eq!(
            client.map_error_code("missing_license_key", None),
            "[missing_license_key] License key does not exist"
        );
    }

    #[tokio::test]
    async fn check_status_without_key_prompts_for_one() {
        let client = offline_client();
        assert_eq!(client.check_status().await, "Enter your theme license key.");
    }

    #[test]
    fn stored_key_is_trimmed_and_blank_reads_as_none() {
        let client = offline_client();
        client.set_license_key("  KEY-1 ");
        assert_eq!(client.license_key(), Some("KEY-1".to_string()));

        client.set_license_key("KEY-1");
        client.options.set("aurora_license_key", "   ");
        assert_eq!(client.license_key(), None);
    }
}
