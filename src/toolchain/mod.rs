//! Toolchain environment snapshots
//!
//! Bootstrapping a toolchain (e.g. sourcing `vcvarsall`) is slow, so snapshots are
//! fetched at most once per parameter string and shared afterwards. Fetches are
//! serialized process-wide: two callers asking for the same parameters never run
//! the script twice, and different parameters never run concurrently.

pub mod bootstrap;
pub mod memo;

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use bootstrap::{
    EnvironmentBootstrap, ProcessCommand, ProcessRunner, ScriptBootstrap, TokioProcessRunner,
    UnconfiguredBootstrap,
};
pub use memo::Memo;

use crate::compdb::provider::EnvironmentSource;
use crate::config::ToolchainConfig;

/// Environment variables captured after running a toolchain bootstrap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainEnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl ToolchainEnvironmentSnapshot {
    /// Exact match first, then an ASCII case-insensitive one (Windows spells `Path`)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .or_else(|| {
                self.vars
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl FromIterator<(String, String)> for ToolchainEnvironmentSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl EnvironmentSource for ToolchainEnvironmentSnapshot {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }
}

/// Caches one snapshot per script parameter string
pub struct ToolchainEnvironmentProvider {
    bootstrap: Arc<dyn EnvironmentBootstrap>,
    cache: Memo<String, Option<Arc<ToolchainEnvironmentSnapshot>>>,
    fetch_lock: Mutex<()>,
    cache_failures: bool,
}

impl ToolchainEnvironmentProvider {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self::with_bootstrap(ScriptBootstrap::from_config(config), config.cache_failures)
    }

    pub fn with_bootstrap(bootstrap: Arc<dyn EnvironmentBootstrap>, cache_failures: bool) -> Self {
        Self {
            bootstrap,
            cache: Memo::new(),
            fetch_lock: Mutex::new(()),
            cache_failures,
        }
    }

    /// Snapshot for `script_params`, fetching it on first use.
    ///
    /// Returns `None` when the bootstrap fails. Failures are only remembered when
    /// `cache_failures` is set, otherwise the next call retries.
    pub async fn get(&self, script_params: &str) -> Option<Arc<ToolchainEnvironmentSnapshot>> {
        if let Some(cached) = self.cache.get(script_params) {
            return cached;
        }

        let _guard = self.fetch_lock.lock().await;

        // Another caller may have finished the fetch while we waited
        if let Some(cached) = self.cache.get(script_params) {
            return cached;
        }

        match self.bootstrap.fetch(script_params).await {
            Ok(snapshot) => {
                debug!(
                    "Captured {} toolchain variables for '{script_params}'",
                    snapshot.len()
                );
                let snapshot = Arc::new(snapshot);
                self.cache
                    .insert(script_params.to_string(), Some(snapshot.clone()));
                Some(snapshot)
            }
            Err(e) => {
                warn!("Toolchain bootstrap failed for '{script_params}': {e}");
                if self.cache_failures {
                    self.cache.insert(script_params.to_string(), None);
                }
                None
            }
        }
    }

    /// Parameter strings with a cached result, successful or not
    pub fn cached_keys(&self) -> Vec<String> {
        self.cache.keys()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}
