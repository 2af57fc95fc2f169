//! Error types for kubeapply-kube

use thiserror::Error;

/// Result type for kubeapply-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while driving kubectl
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Manifest loading or materialization failed
    #[error(transparent)]
    Core(#[from] kubeapply_core::CoreError),

    /// kubectl ran but reported failure; the combined output is attached
    #[error("`{command}` failed ({status})\noutput:\n{output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    /// The executable could not be started
    #[error("failed to run {program}: {source}\nHint: Check that {program} is installed and on your PATH")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Timeout
    #[error("operation timed out after {0}")]
    Timeout(String),

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Kubeconfig could not be loaded
    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// API resource discovery failed
    #[error("discovery error: {0}")]
    Discovery(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Combined command output attached to a failed kubectl call
    pub fn output(&self) -> Option<&str> {
        match self {
            KubeError::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}
