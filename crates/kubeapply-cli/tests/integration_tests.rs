//! Integration tests for CLI commands

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to run kubeapply with an isolated environment
fn kubeapply(args: &[&str], home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kubeapply"))
        .args(args)
        .env_remove("KUBECONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .output()
        .expect("Failed to execute kubeapply")
}

/// Helper to run kadiff
fn kadiff(args: &[&str], envs: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kadiff"))
        .args(args)
        .envs(envs.iter().copied())
        .output()
        .expect("Failed to execute kadiff")
}

const LIVE_CONFIGMAP: &str = "apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: prod
data:
  mode: slow
";

const MERGED_CONFIGMAP: &str = "apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
  namespace: prod
data:
  mode: fast
";

mod order_command {
    use super::*;

    #[test]
    fn test_order_skips_bad_documents() {
        let home = TempDir::new().unwrap();
        let manifests = TempDir::new().unwrap();
        fs::write(
            manifests.path().join("mixed.yaml"),
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n  namespace: prod\n---\nkind: Secret\n---\n: not yaml [\n",
        )
        .unwrap();
        fs::write(manifests.path().join("README.md"), "kind: Namespace\n").unwrap();

        let output = kubeapply(&["order", manifests.path().to_str().unwrap()], home.path());
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.lines().count(), 1);
        assert!(stdout.contains("v1.Service.prod.web"));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("skipping"));
    }

    #[test]
    fn test_order_missing_path_fails() {
        let home = TempDir::new().unwrap();
        let output = kubeapply(&["order", "/nonexistent/manifests"], home.path());
        assert_eq!(output.status.code(), Some(3));
    }
}

mod cluster_commands {
    use super::*;

    #[test]
    fn test_missing_kubeconfig() {
        let home = TempDir::new().unwrap();
        let output = kubeapply(&["delete", "v1.ConfigMap.prod.settings"], home.path());

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("no kubeconfig given"));
    }

    #[test]
    fn test_missing_kubectl_binary() {
        let home = TempDir::new().unwrap();
        let manifests = TempDir::new().unwrap();
        fs::write(
            manifests.path().join("ns.yaml"),
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: prod\n",
        )
        .unwrap();

        let output = kubeapply(
            &[
                "--kubeconfig",
                "/dev/null",
                "--kubectl",
                "/nonexistent/kubectl",
                "apply",
                manifests.path().to_str().unwrap(),
            ],
            home.path(),
        );
        assert_eq!(output.status.code(), Some(4));
    }
}

#[cfg(unix)]
mod fake_kubectl {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_apply_passes_materialized_dir() {
        let home = TempDir::new().unwrap();
        let manifests = TempDir::new().unwrap();
        fs::write(
            manifests.path().join("app.yaml"),
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n  namespace: prod\n---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: prod\n",
        )
        .unwrap();

        // Echo the arguments and list the directory passed with -f
        let kubectl = write_script(
            home.path(),
            "kubectl",
            "#!/bin/sh\necho \"$@\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-f\" ]; then ls \"$2\"; fi\n  shift\ndone\n",
        );

        let output = kubeapply(
            &[
                "--kubeconfig",
                "/tmp/kubeconfig",
                "--kubectl",
                &kubectl,
                "apply",
                "--dry-run",
                manifests.path().to_str().unwrap(),
            ],
            home.path(),
        );
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<_> = stdout.lines().collect();
        assert!(lines[0].starts_with("apply --kubeconfig /tmp/kubeconfig -R -f "));
        assert!(lines[0].ends_with("--dry-run"));
        assert_eq!(lines[1], "000000_prod__Namespace.yaml");
        assert_eq!(lines[2], "000001_web_prod_Service.yaml");
    }

    #[test]
    fn test_structured_diff_end_to_end() {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let live = work.path().join("LIVE");
        let merged = work.path().join("MERGED");
        fs::create_dir_all(&live).unwrap();
        fs::create_dir_all(&merged).unwrap();
        fs::write(live.join("v1.ConfigMap.prod.settings"), LIVE_CONFIGMAP).unwrap();
        fs::write(merged.join("v1.ConfigMap.prod.settings"), MERGED_CONFIGMAP).unwrap();

        // Behave like kubectl diff: hand both trees to the external differ
        let body = format!(
            "#!/bin/sh\necho 'Warning: using fake kubectl' 1>&2\n\"$KUBECTL_EXTERNAL_DIFF\" \"{}\" \"{}\"\nexit 1\n",
            live.display(),
            merged.display()
        );
        let kubectl = write_script(home.path(), "kubectl", &body);

        let output = kubeapply(
            &[
                "--kubeconfig",
                "/tmp/kubeconfig",
                "--kubectl",
                &kubectl,
                "--kadiff",
                env!("CARGO_BIN_EXE_kadiff"),
                "diff",
                "--structured",
                work.path().to_str().unwrap(),
            ],
            home.path(),
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            output.status.success(),
            "diff failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(stdout.contains("Diffs summary:"));
        assert!(stdout.contains("v1.ConfigMap.prod.settings"));
        assert!(stdout.contains("-  mode: slow"));
        assert!(stdout.contains("+  mode: fast"));
    }

    #[test]
    fn test_delete_resolves_plural_names() {
        let home = TempDir::new().unwrap();
        let body = "#!/bin/sh
for arg in \"$@\"; do
  if [ \"$arg\" = \"api-resources\" ]; then
    echo 'NAME         SHORTNAMES   APIVERSION   NAMESPACED   KIND'
    echo 'configmaps   cm           v1           true         ConfigMap'
    exit 0
  fi
done
echo \"$@\"
";
        let kubectl = write_script(home.path(), "kubectl", body);

        let output = kubeapply(
            &[
                "--kubeconfig",
                "/tmp/kubeconfig",
                "--kubectl",
                &kubectl,
                "delete",
                "v1.ConfigMap.prod.settings",
                "v1.Widget.prod.unknown",
            ],
            home.path(),
        );
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(
            stdout.trim(),
            "--kubeconfig /tmp/kubeconfig --ignore-not-found=true --wait=false delete configmaps settings -n prod"
        );
    }
}

mod kadiff_binary {
    use super::*;

    #[test]
    fn test_kadiff_envelope() {
        let work = TempDir::new().unwrap();
        let live = work.path().join("LIVE");
        let merged = work.path().join("MERGED");
        fs::create_dir_all(&live).unwrap();
        fs::create_dir_all(&merged).unwrap();
        fs::write(live.join("v1.ConfigMap.prod.settings"), LIVE_CONFIGMAP).unwrap();
        fs::write(merged.join("v1.ConfigMap.prod.settings"), MERGED_CONFIGMAP).unwrap();
        fs::write(merged.join("v1.ConfigMap.prod.new"), MERGED_CONFIGMAP).unwrap();

        let output = kadiff(
            &[live.to_str().unwrap(), merged.to_str().unwrap()],
            &[],
        );
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["name"], "v1.ConfigMap.prod.new");
        assert_eq!(results[0]["operation"], "create");
        assert_eq!(results[1]["operation"], "update");
        assert_eq!(results[1]["numAdded"], 1);
        assert_eq!(results[1]["numRemoved"], 1);
        assert_eq!(results[1]["object"]["metadata"]["name"], "settings");
    }

    #[test]
    fn test_kadiff_identical_trees() {
        let work = TempDir::new().unwrap();
        let live = work.path().join("LIVE");
        let merged = work.path().join("MERGED");
        fs::create_dir_all(&live).unwrap();
        fs::create_dir_all(&merged).unwrap();
        fs::write(live.join("a"), LIVE_CONFIGMAP).unwrap();
        fs::write(merged.join("a"), LIVE_CONFIGMAP).unwrap();

        let output = kadiff(&[live.to_str().unwrap(), merged.to_str().unwrap()], &[]);
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["results"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_kadiff_reads_limits_from_env() {
        let work = TempDir::new().unwrap();
        let old = work.path().join("old.yaml");
        let new = work.path().join("new.yaml");
        fs::write(&old, LIVE_CONFIGMAP).unwrap();
        fs::write(&new, MERGED_CONFIGMAP).unwrap();

        let output = kadiff(
            &[old.to_str().unwrap(), new.to_str().unwrap()],
            &[("KADIFF_MAX_SIZE", "10")],
        );
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let raw = json["results"][0]["rawDiff"].as_str().unwrap();
        assert!(raw.ends_with("chars omitted)"));
    }
}
