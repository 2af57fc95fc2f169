//! CLI commands

pub mod api_resources;
pub mod apply;
pub mod delete;
pub mod diff;
pub mod order;

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use kubeapply_kube::{ClientConfig, DiscoveryMode, OrderedClient};
use tracing::debug;

use crate::error::{CliError, Result};

/// How kinds are resolved to resource names for deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiscoveryArg {
    /// Parse `kubectl api-resources`
    Table,
    /// Query the API server directly
    Live,
}

impl From<DiscoveryArg> for DiscoveryMode {
    fn from(arg: DiscoveryArg) -> Self {
        match arg {
            DiscoveryArg::Table => DiscoveryMode::Table,
            DiscoveryArg::Live => DiscoveryMode::Live,
        }
    }
}

/// Options shared by every command that talks to a cluster
#[derive(Debug, Clone, Default, Args)]
pub struct ClusterArgs {
    /// Path to the kubeconfig for the target cluster
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Client configuration file (default: <config dir>/kubeapply/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// kubectl executable
    #[arg(long, global = true)]
    pub kubectl: Option<PathBuf>,

    /// Structured diff hook executable
    #[arg(long, global = true)]
    pub kadiff: Option<PathBuf>,

    /// Keep temporary manifest directories
    #[arg(long, global = true)]
    pub keep_configs: bool,

    /// Use server-side apply and diff
    #[arg(long, global = true)]
    pub server_side: bool,

    /// API resource discovery strategy
    #[arg(long, value_enum, global = true)]
    pub discovery: Option<DiscoveryArg>,

    /// Per-command timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Extra environment for kubectl (KEY=VALUE, repeatable)
    #[arg(long = "env", global = true)]
    pub extra_env: Vec<String>,
}

impl ClusterArgs {
    /// Build the client configuration: file values first, then flags
    pub fn client_config(&self, debug: bool) -> Result<ClientConfig> {
        let mut config = match self.config_file() {
            Some(path) => {
                debug!("Loading client configuration from {}", path.display());
                ClientConfig::load_from(&path)?
            }
            None => {
                let kubeconfig = self.kubeconfig.clone().ok_or_else(|| {
                    CliError::config_with_help(
                        "no kubeconfig given",
                        "Pass --kubeconfig, set KUBECONFIG, or write a config file with --config",
                    )
                })?;
                ClientConfig::new(kubeconfig)
            }
        };

        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubeconfig = kubeconfig.clone();
        }
        if let Some(kubectl) = &self.kubectl {
            config.kubectl_path = kubectl.clone();
        }
        if let Some(kadiff) = &self.kadiff {
            config.kadiff_path = kadiff.clone();
        }
        if let Some(discovery) = self.discovery {
            config.discovery = discovery.into();
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
        config.keep_configs |= self.keep_configs;
        config.server_side_apply |= self.server_side;
        config.debug |= debug;
        config.extra_env.extend(self.extra_env.iter().cloned());

        config.validate()?;
        Ok(config)
    }

    pub fn client(&self, debug: bool) -> Result<OrderedClient> {
        Ok(OrderedClient::new(self.client_config(debug)?)?)
    }

    fn config_file(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join("kubeapply").join("config.yaml"))
                .filter(|path| path.is_file())
        })
    }
}
