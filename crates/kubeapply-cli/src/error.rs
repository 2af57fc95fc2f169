//! CLI error types with exit code handling
//!
//! Library errors are mapped onto a small set of diagnostics, each with its
//! own exit code.

use kubeapply_kube::{KubeError, prettify_output};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration could not be assembled
    #[error("Configuration error: {message}")]
    #[diagnostic(code(kubeapply::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifests could not be loaded or written
    #[error("Manifest error: {message}")]
    #[diagnostic(code(kubeapply::cli::manifest))]
    Manifest { message: String },

    /// kubectl failed; the help text carries its output
    #[error("kubectl error: {message}")]
    #[diagnostic(code(kubeapply::cli::kubectl))]
    Kubectl {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(kubeapply::cli::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(kubeapply::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Manifest { .. } => exit_codes::MANIFEST_ERROR,
            CliError::Kubectl { .. } => exit_codes::KUBECTL_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Core(core) => CliError::Manifest {
                message: core.to_string(),
            },
            KubeError::CommandFailed {
                command,
                status,
                output,
            } => CliError::Kubectl {
                message: format!("`{}` failed ({})", command, status),
                help: Some(prettify_output(&output)).filter(|o| !o.is_empty()),
            },
            KubeError::Spawn { program, source } => CliError::Kubectl {
                message: format!("failed to run {}: {}", program, source),
                help: Some(format!(
                    "Check that {} is installed and on your PATH, or pass --kubectl",
                    program
                )),
            },
            KubeError::Timeout(after) => CliError::Kubectl {
                message: format!("kubectl timed out after {}", after),
                help: Some("Raise the limit with --timeout".to_string()),
            },
            KubeError::InvalidConfig(message) => CliError::Config {
                message,
                help: None,
            },
            KubeError::Kubeconfig(e) => CliError::Config {
                message: e.to_string(),
                help: Some("Check the --kubeconfig path".to_string()),
            },
            KubeError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

impl From<kubeapply_core::CoreError> for CliError {
    fn from(err: kubeapply_core::CoreError) -> Self {
        CliError::Manifest {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
