//! Shared test helpers: a scripted transport and client builders.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use theme_updater::{
    ApiTransport, HttpReply, LicenseClient, MemoryOptionStore, MemoryTransientStore,
    UpdateChecker, UpdaterConfig, UpdaterError, UpdaterResult, UpdaterStrings,
};

/// Transport that replays scripted replies and records every call.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<UpdaterResult<HttpReply>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

#[allow(dead_code)]
impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, status: u16, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(HttpReply {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_transport_error(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(UpdaterError::Transport(
                "connection refused".to_string(),
            )));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn last_field(&self, name: &str) -> Option<String> {
        self.last_call().and_then(|(_, fields)| {
            fields
                .into_iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value)
        })
    }
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> UpdaterResult<HttpReply> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), fields.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpdaterError::Transport("no scripted reply".to_string())))
    }
}

/// Everything a test needs to drive the clients against in-memory hosts.
pub struct Harness {
    pub config: UpdaterConfig,
    pub transport: Arc<FakeTransport>,
    pub options: Arc<MemoryOptionStore>,
    pub transients: Arc<MemoryTransientStore>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_config(sample_config())
    }

    pub fn with_config(config: UpdaterConfig) -> Self {
        Self {
            config,
            transport: Arc::new(FakeTransport::new()),
            options: Arc::new(MemoryOptionStore::new()),
            transients: Arc::new(MemoryTransientStore::new()),
        }
    }

    pub fn license_client(&self) -> LicenseClient {
        LicenseClient::new(
            self.config.clone(),
            UpdaterStrings::default(),
            self.transport.clone(),
            self.options.clone(),
            self.transients.clone(),
        )
    }

    pub fn update_checker(&self) -> UpdateChecker {
        UpdateChecker::new(
            self.config.clone(),
            UpdaterStrings::default(),
            self.transport.clone(),
            self.options.clone(),
            self.transients.clone(),
        )
    }
}

pub fn sample_config() -> UpdaterConfig {
    UpdaterConfig {
        license_api_url: "https://shop.example/api/v1/license".to_string(),
        update_api_url: "https://shop.example/api/v1/update".to_string(),
        theme_slug: "aurora".to_string(),
        download_tag: "aurora-theme".to_string(),
        license_url: "https://my-site.example".to_string(),
        version: "1.0.0".to_string(),
        author: "Example Co".to_string(),
        ..UpdaterConfig::default()
    }
}
