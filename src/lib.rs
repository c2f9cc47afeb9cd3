//! License activation and auto-update client for commercially distributed
//! themes.
//!
//! Two cooperating clients sit behind this crate:
//!
//! - [`license::LicenseClient`] activates, deactivates and reports the status
//!   of a license key against a remote licensing endpoint, mapping known
//!   error codes to user-facing messages.
//! - [`update::UpdateChecker`] polls a remote update endpoint, caches the
//!   result per channel (12 h on success, 30 min on failure) and hands
//!   update metadata to the host's own updater.
//!
//! The host platform supplies storage and UI: durable options and transient
//! caching are injected through the [`store`] traits, the outbound HTTP call
//! through [`api::ApiTransport`]. The host-integration layer invokes the
//! documented entry points at the matching lifecycle moments (settings-page
//! load, key change, update-screen load).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use theme_updater::{
//!     HttpTransport, LicenseClient, MemoryOptionStore, MemoryTransientStore,
//!     UpdateChecker, UpdaterConfig, UpdaterStrings,
//! };
//!
//! # async fn run() -> Result<(), theme_updater::UpdaterError> {
//! let config = UpdaterConfig {
//!     license_api_url: "https://shop.example/api/v1/license".into(),
//!     update_api_url: "https://shop.example/api/v1/update".into(),
//!     theme_slug: "aurora".into(),
//!     download_tag: "aurora-theme".into(),
//!     license_url: "https://my-site.example".into(),
//!     author: "Example Co".into(),
//!     ..UpdaterConfig::default()
//! }
//! .resolve_version("1.0.0");
//!
//! let transport = Arc::new(HttpTransport::new(config.verify_ssl)?);
//! let options = Arc::new(MemoryOptionStore::new());
//! let transients = Arc::new(MemoryTransientStore::new());
//!
//! let license = LicenseClient::new(
//!     config.clone(),
//!     UpdaterStrings::default(),
//!     transport.clone(),
//!     options.clone(),
//!     transients.clone(),
//! );
//!
//! license.set_license_key("LICENSE-KEY");
//! let outcome = license.activate().await;
//! println!("{}", license.check_status().await);
//!
//! let updates = UpdateChecker::new(
//!     config,
//!     UpdaterStrings::default(),
//!     transport,
//!     options,
//!     transients,
//! );
//! if let Some(notice) = updates.update_notice("Aurora").await {
//!     println!("{}", notice.headline);
//! }
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod license;
pub mod store;
pub mod strings;
pub mod update;

pub use api::{ApiTransport, Expiry, HttpReply, HttpTransport, LicenseResponse, VersionResponse};
pub use config::UpdaterConfig;
pub use errors::{UpdaterError, UpdaterResult};
pub use license::{ActivationOutcome, LicenseClient, LicenseStatus, MessageFilter};
pub use store::{MemoryOptionStore, MemoryTransientStore, OptionStore, TransientStore};
pub use strings::UpdaterStrings;
pub use update::{UpdateChecker, UpdateNotice};
