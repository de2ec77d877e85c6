//! Shared application state.
//!
//! Credentials and proxies are held as one immutable [`ConfigSnapshot`].
//! Configuration calls build a new snapshot and swap it in; request handlers
//! clone the current `Arc` once and work from that copy for the whole request.

use log::info;
use std::sync::{Arc, RwLock};

use crate::config::{get_api_base_url, Credentials};

/// The configuration visible to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub credentials: Option<Credentials>,
    pub proxies: Vec<String>,
}

impl ConfigSnapshot {
    /// The proxy every upstream call goes through. Only the first entry counts.
    pub fn active_proxy(&self) -> Option<&str> {
        self.proxies.first().map(String::as_str)
    }
}

/// Process-wide configuration holder.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl ConfigStore {
    pub fn new(initial: ConfigSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        // A poisoned lock still holds a complete snapshot
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Replaces the credentials, keeping the current proxies.
    pub fn replace_credentials(&self, credentials: Credentials) {
        self.update(|snapshot| snapshot.credentials = Some(credentials));
    }

    /// Replaces the proxy list verbatim, keeping the current credentials.
    pub fn replace_proxies(&self, proxies: Vec<String>) {
        self.update(|snapshot| snapshot.proxies = proxies);
    }

    fn update(&self, apply: impl FnOnce(&mut ConfigSnapshot)) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let mut next = ConfigSnapshot::clone(&**guard);
        apply(&mut next);
        *guard = Arc::new(next);
    }
}

/// State handed to every axum handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    /// Base URL of the upstream API, without a trailing slash.
    pub api_base_url: Arc<str>,
}

impl AppState {
    pub fn new(api_base_url: impl Into<String>, initial: ConfigSnapshot) -> Self {
        let base: String = api_base_url.into();
        Self {
            config: Arc::new(ConfigStore::new(initial)),
            api_base_url: Arc::from(base.trim_end_matches('/')),
        }
    }

    /// Builds the state from environment variables.
    ///
    /// Environment credentials only seed the store; `/account_manage` replaces them.
    pub fn from_env() -> Self {
        let credentials = Credentials::from_env();
        let api_base_url = get_api_base_url();
        info!("Upstream API base URL: {}", api_base_url);
        Self::new(
            api_base_url,
            ConfigSnapshot {
                credentials,
                proxies: Vec::new(),
            },
        )
    }
}
