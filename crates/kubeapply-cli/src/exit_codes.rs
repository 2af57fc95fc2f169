//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - missing kubeconfig, unreadable config file
pub const CONFIG_ERROR: i32 = 2;

/// Manifest error - manifests could not be read or materialized
pub const MANIFEST_ERROR: i32 = 3;

/// kubectl error - kubectl failed or could not be started
pub const KUBECTL_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
