//! Snapshot tests for command output formatting

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run kubeapply and capture output
fn kubeapply_output(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_kubeapply"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute kubeapply");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

fn create_manifests() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::write(
        dir.path().join("app.yaml"),
        "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: prod\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n  namespace: prod\ndata:\n  mode: fast\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("namespace.yaml"),
        "---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: prod\n",
    )
    .unwrap();

    dir
}

#[test]
fn test_order_output() {
    let manifests = create_manifests();
    let (stdout, stderr, success) = kubeapply_output(&["order", manifests.path().to_str().unwrap()]);

    assert!(success, "order failed: {}", stderr);
    insta::assert_snapshot!(stdout.trim_end(), @r"
    000000 v1.Namespace..prod 07c2bc6871bb
    000001 v1.ConfigMap.prod.settings 2bfdfbaeaedf
    000002 apps/v1.Deployment.prod.web cf50011f21c0
    ");
    assert!(stderr.contains("3 manifest(s), digest "));
}
