//! Update checker: polls the update endpoint and surfaces "new version
//! available" data to the host's updater.
//!
//! Results are cached per (slug, beta channel): 12 hours after a successful
//! check, 30 minutes after a failed one. The failure record carries the
//! installed version as `new_version`, so the comparison below reports "no
//! update" instead of false-triggering, and the short lifetime is the only
//! retry mechanism.

use std::sync::Arc;

use chrono::Duration;
use semver::Version;

use crate::api::{ApiTransport, VersionResponse};
use crate::config::UpdaterConfig;
use crate::errors::{UpdaterError, UpdaterResult};
use crate::license::LicenseStatus;
use crate::store::{OptionStore, TransientStore};
use crate::strings::UpdaterStrings;

/// Cache lifetime after a successful version check.
fn success_lifetime() -> Duration {
    Duration::hours(12)
}

/// Cache lifetime after a failed version check.
fn failure_lifetime() -> Duration {
    Duration::minutes(30)
}

/// Data for the host's update-notification banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    /// Banner headline, e.g. "Aurora 2.1.0 is available.".
    pub headline: String,
    pub new_version: String,
    /// Changelog HTML, or the "no changelog" placeholder.
    pub changelog: String,
    /// Confirmation prompt shown before the update action proceeds.
    pub confirm_message: String,
}

/// Client for the remote update endpoint.
pub struct UpdateChecker {
    config: UpdaterConfig,
    strings: UpdaterStrings,
    transport: Arc<dyn ApiTransport>,
    options: Arc<dyn OptionStore>,
    transients: Arc<dyn TransientStore>,
}

impl UpdateChecker {
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
        }
    }

    /// True when the durable license status is `valid`. Hosts gate update
    /// checks on this so unlicensed installs never poll the endpoint.
    pub fn license_active(&self) -> bool {
        self.options
            .get(&self.config.status_option())
            .map(|raw| LicenseStatus::parse(&raw) == LicenseStatus::Valid)
            .unwrap_or(false)
    }

    /// Latest update metadata, or `None` when the installed version is
    /// current (or newer, or the check failed).
    ///
    /// A cache hit skips the network entirely; a miss issues one
    /// `get_version` call and stores the result with the success/failure
    /// lifetime.
    pub async fn check_for_update(&self) -> Option<VersionResponse> {
        let cache_key = self.config.update_transient();

        let record = match self.cached_record(&cache_key) {
            Some(record) => {
                tracing::debug!(key = %cache_key, "update response served from cache");
                record
            }
            None => self.refresh(&cache_key).await,
        };

        if version_lt(&self.config.version, &record.new_version) {
            Some(record)
        } else {
            None
        }
    }

    /// Drop the cached update record so the next check re-queries.
    ///
    /// Called whenever the host flushes its own update metadata or loads an
    /// update-management screen.
    pub fn invalidate_cache(&self) {
        self.transients.delete(&self.config.update_transient());
    }

    /// Read path for the host's notification surface.
    pub async fn update_notice(&self, theme_name: &str) -> Option<UpdateNotice> {
        let record = self.check_for_update().await?;
        let changelog = record
            .changelog()
            .map(str::to_string)
            .unwrap_or_else(|| self.strings.no_changelog.clone());

        Some(UpdateNotice {
            headline: self
                .strings
                .update_headline(theme_name, &record.new_version),
            new_version: record.new_version,
            changelog,
            confirm_message: self.strings.update_notice.clone(),
        })
    }

    /// Update record shaped for the host's own updater transient: the raw
    /// metadata plus the `theme` slug entry the host keys on.
    pub async fn host_update_entry(&self) -> Option<serde_json::Value> {
        let record = self.check_for_update().await?;
        let mut value = serde_json::to_value(&record).ok()?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "theme".to_string(),
                serde_json::Value::String(self.config.slug()),
            );
        }
        Some(value)
    }

    fn cached_record(&self, cache_key: &str) -> Option<VersionResponse> {
        let raw = self.transients.get(cache_key)?;
        // A corrupt cache entry reads as a miss.
        serde_json::from_str(&raw).ok()
    }

    async fn refresh(&self, cache_key: &str) -> VersionResponse {
        match self.request_version().await {
            Ok(record) => {
                self.store(cache_key, &record, success_lifetime());
                record
            }
            Err(err) => {
                tracing::warn!(error = %err, "update check failed; next retry after cache expiry");
                let fallback = VersionResponse::fallback(&self.config.version);
                self.store(cache_key, &fallback, failure_lifetime());
                fallback
            }
        }
    }

    fn store(&self, cache_key: &str, record: &VersionResponse, lifetime: Duration) {
        match serde_json::to_string(record) {
            Ok(raw) => self.transients.set(cache_key, &raw, lifetime),
            Err(err) => tracing::warn!(error = %err, "could not serialize update record"),
        }
    }

    async fn request_version(&self) -> UpdaterResult<VersionResponse> {
        let license_key = self
            .options
            .get(&self.config.license_key_option())
            .map(|key| key.trim().to_string())
            .unwrap_or_default();

        let fields = vec![
            ("action".to_string(), "get_version".to_string()),
            ("license_key".to_string(), license_key),
            ("license_url".to_string(), self.config.license_url.clone()),
            ("download_tag".to_string(), self.config.download_tag.clone()),
            ("slug".to_string(), self.config.slug()),
            ("version".to_string(), self.config.version.clone()),
            ("author".to_string(), self.config.author.clone()),
            ("beta".to_string(), self.config.beta.to_string()),
        ];

        let reply = self
            .transport
            .post_form(&self.config.update_api_url, &fields)
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

/// Strict semantic-version "less than". Versions that do not parse never
/// trigger an update (fail safe, consistent with the failure record).
fn version_lt(installed: &str, candidate: &str) -> bool {
    match (parse_version(installed), parse_version(candidate)) {
        (Some(installed), Some(candidate)) => installed < candidate,
        _ => false,
    }
}

/// Parse a version string, tolerating a leading `v` and the short "1.2"
/// shape common in theme headers.
fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    let dots = trimmed.chars().filter(|c| *c == '.').count();
    if dots < 2 && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        let padded = format!("{}{}", trimmed, ".0".repeat(2 - dots));
        return Version::parse(&padded).ok();
    }
    None
}
