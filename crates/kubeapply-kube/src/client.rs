//! Ordered kubectl client
//!
//! [`OrderedClient`] wraps kubectl so that resources are applied in a
//! safe, deterministic order. The operations themselves are split across
//! modules: apply in [`crate::apply`], diff in [`crate::diff`] and delete in
//! [`crate::delete`].

use std::path::Path;
use std::sync::Arc;

use kubeapply_core::KindPriority;
use tempfile::TempDir;
use tracing::info;

use crate::config::{ClientConfig, DiscoveryMode};
use crate::discovery::{ApiResourceDiscovery, LiveDiscovery, TableDiscovery};
use crate::error::Result;
use crate::runner::{CommandRunner, Invocation, KubectlRunner};

/// kubectl-backed client that orders resources before applying them
pub struct OrderedClient {
    pub(crate) config: ClientConfig,
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) priority: KindPriority,
    pub(crate) discovery: Arc<dyn ApiResourceDiscovery>,
}

impl OrderedClient {
    /// Create a client that runs the configured kubectl binary
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runner: Arc<dyn CommandRunner> =
            Arc::new(KubectlRunner::new(&config.kubectl_path).with_timeout(config.timeout()));
        Self::with_runner(config, runner)
    }

    /// Create a client around an existing runner
    ///
    /// The configuration is validated first. Discovery follows
    /// `config.discovery` and shares the runner.
    pub fn with_runner(config: ClientConfig, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        config.validate()?;
        let discovery: Arc<dyn ApiResourceDiscovery> = match config.discovery {
            DiscoveryMode::Table => Arc::new(
                TableDiscovery::new(runner.clone(), config.kubeconfig.clone())
                    .with_env(config.extra_env_pairs()?),
            ),
            DiscoveryMode::Live => Arc::new(LiveDiscovery::new(config.kubeconfig.clone())),
        };

        Ok(Self {
            config,
            runner,
            priority: KindPriority::default(),
            discovery,
        })
    }

    /// Replace the kind priority table
    pub fn with_priority(mut self, priority: KindPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Replace the API resource discovery strategy
    pub fn with_discovery(mut self, discovery: Arc<dyn ApiResourceDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn discovery(&self) -> &dyn ApiResourceDiscovery {
        self.discovery.as_ref()
    }

    pub(crate) fn kubeconfig_arg(&self) -> String {
        self.config.kubeconfig.display().to_string()
    }

    /// Append the debug verbosity flag and the configured extra environment
    pub(crate) fn finish_invocation(&self, mut invocation: Invocation) -> Result<Invocation> {
        if self.config.server_side_apply {
            invocation = invocation.arg("--server-side").arg("true");
        }
        if self.config.debug {
            invocation = invocation.arg("-v").arg("8");
        }
        Ok(invocation.envs(self.config.extra_env_pairs()?))
    }
}

/// Temporary working directory owned by one client operation
///
/// Removed on drop unless `keep` is set, in which case the path is logged and
/// left on disk for inspection.
pub struct WorkDir {
    dir: Option<TempDir>,
    keep: bool,
}

impl WorkDir {
    pub fn new(prefix: &str, keep: bool) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Ok(Self {
            dir: Some(dir),
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if self.keep {
                let path = dir.keep();
                info!("Keeping temporary configs in {}", path.display());
            }
        }
    }
}
