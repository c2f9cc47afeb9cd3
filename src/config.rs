//! Configuration for the license client and update checker.
//!
//! A host normally builds [`UpdaterConfig`] in code, but the standard layered
//! loading is also available with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `updater.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `THEME_UPDATER_LICENSE_API_URL` - Licensing endpoint
//! - `THEME_UPDATER_UPDATE_API_URL` - Update endpoint
//! - `THEME_UPDATER_THEME_SLUG` - Theme slug
//! - `THEME_UPDATER_DOWNLOAD_TAG` - Download tag of the purchased item
//! - `THEME_UPDATER_LICENSE_URL` - Licensed site URL
//! - `THEME_UPDATER_VERSION` - Installed version
//! - `THEME_UPDATER_AUTHOR` - Theme author
//! - `THEME_UPDATER_BETA` - Opt into the beta update channel
//! - `THEME_UPDATER_VERIFY_SSL` - TLS certificate verification policy

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::errors::UpdaterResult;

/// Immutable per-product configuration.
///
/// Constructed once per request cycle; the clients never mutate it. The
/// `version` field may be left empty and resolved from host theme metadata
/// through [`UpdaterConfig::resolve_version`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Licensing endpoint (activate / deactivate / info).
    pub license_api_url: String,
    /// Update endpoint (get_version).
    pub update_api_url: String,
    /// Slug identifying the installed theme.
    pub theme_slug: String,
    /// Download tag of the purchased item.
    pub download_tag: String,
    /// URL of the licensed site, sent as `license_url`.
    pub license_url: String,
    /// Installed version; empty means "resolve from host metadata".
    pub version: String,
    /// Theme author, sent with update checks.
    pub author: String,
    /// Beta channel opt-in. Beta and stable results are cached separately.
    pub beta: bool,
    /// TLS verification policy for outbound calls.
    pub verify_ssl: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            license_api_url: "https://example.org/api/v1/license".to_string(),
            update_api_url: "https://example.org/api/v1/update".to_string(),
            theme_slug: String::new(),
            download_tag: String::new(),
            license_url: String::new(),
            version: String::new(),
            author: String::new(),
            beta: false,
            verify_ssl: true,
        }
    }
}

impl UpdaterConfig {
    /// Load configuration from `updater.toml` and `THEME_UPDATER_*`
    /// environment variables.
    pub fn load() -> UpdaterResult<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("updater").required(false))
            .add_source(Environment::with_prefix("THEME_UPDATER").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Extension hook: adjust the config before the clients are built.
    /// The closure is a pure function over the data.
    pub fn with_overrides(self, adjust: impl FnOnce(UpdaterConfig) -> UpdaterConfig) -> Self {
        adjust(self)
    }

    /// Fill an empty `version` from host theme metadata. Resolution happens
    /// once, at construction time.
    pub fn resolve_version(mut self, metadata_version: &str) -> Self {
        if self.version.is_empty() {
            self.version = metadata_version.to_string();
        }
        self
    }

    /// Sanitized slug used in every storage key.
    pub fn slug(&self) -> String {
        sanitize_key(&self.theme_slug)
    }

    // === Storage Keys ===

    /// Durable option holding the license key.
    pub fn license_key_option(&self) -> String {
        format!("{}_license_key", self.slug())
    }

    /// Durable option holding the last known license status.
    pub fn status_option(&self) -> String {
        format!("{}_license_key_status", self.slug())
    }

    /// Transient holding the cached status message (24 h lifetime).
    pub fn message_transient(&self) -> String {
        format!("{}_license_message", self.slug())
    }

    /// Transient holding the cached update response. Keyed by beta flag so
    /// the channels never collide.
    pub fn update_transient(&self) -> String {
        format!("{}-{}-update-response", self.slug(), self.beta)
    }
}

/// Lowercase and strip everything outside `[a-z0-9_-]`, the same shape the
/// host enforces for option keys.
fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn sample_config() -> UpdaterConfig {
        UpdaterConfig {
            theme_slug: "aurora".to_string(),
            download_tag: "aurora-theme".to_string(),
            license_url: "https://shop.example".to_string(),
            version: "1.0.0".to_string(),
            author: "Example Co".to_string(),
            ..UpdaterConfig::default()
        }
    }

    #[test]
    fn storage_keys_are_slug_scoped() {
        let config = sample_config();
        assert_eq!(config.license_key_option(), "aurora_license_key");
        assert_eq!(config.status_option(), "aurora_license_key_status");
        assert_eq!(config.message_transient(), "aurora_license_message");
        assert_eq!(config.update_transient(), "aurora-false-update-response");
    }

    #[test]
    fn beta_flag_changes_the_update_key() {
        let stable = sample_config();
        let beta = UpdaterConfig {
            beta: true,
            ..sample_config()
        };
        assert_ne!(stable.update_transient(), beta.update_transient());
        assert_eq!(beta.update_transient(), "aurora-true-update-response");
    }

    #[test]
    fn slug_is_sanitized() {
        let config = UpdaterConfig {
            theme_slug: "Aurora Theme!".to_string(),
            ..UpdaterConfig::default()
        };
        assert_eq!(config.slug(), "auroratheme");
    }

    #[test]
    fn version_fallback_only_fills_empty() {
        let resolved = UpdaterConfig::default().resolve_version("2.3.4");
        assert_eq!(resolved.version, "2.3.4");

        let explicit = sample_config().resolve_version("9.9.9");
        assert_eq!(explicit.version, "1.0.0");
    }

    #[test]
    fn override_hook_is_applied() {
        let config = sample_config().with_overrides(|mut c| {
            c.beta = true;
            c
        });
        assert!(config.beta);
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        env::set_var("THEME_UPDATER_THEME_SLUG", "midnight");
        env::set_var("THEME_UPDATER_BETA", "true");

        let config = UpdaterConfig::load().expect("load should succeed");
        assert_eq!(config.theme_slug, "midnight");
        assert!(config.beta);

        env::remove_var("THEME_UPDATER_THEME_SLUG");
        env::remove_var("THEME_UPDATER_BETA");
    }

    #[test]
    #[serial]
    fn load_without_sources_yields_defaults() {
        let config = UpdaterConfig::load().expect("load should succeed");
        assert_eq!(config, UpdaterConfig::default());
    }
}
