//! Targeted deletes by resource identifier

use kubeapply_core::ResourceId;
use tracing::warn;

use crate::client::OrderedClient;
use crate::error::Result;
use crate::runner::Invocation;

impl OrderedClient {
    /// Delete the resources named by `ids`
    ///
    /// Identifiers that do not decode, and kinds the cluster does not serve,
    /// are skipped with a warning. Deletes run one at a time in the given
    /// order; the first failure stops the batch and is returned with its
    /// output, leaving earlier deletes in place. On success the trimmed
    /// outputs are joined with newlines.
    pub async fn delete<S: AsRef<str>>(&self, ids: &[S]) -> Result<String> {
        let targets: Vec<ResourceId> = ids
            .iter()
            .filter_map(|id| {
                let decoded = ResourceId::decode(id.as_ref());
                if decoded.is_empty() {
                    warn!("Could not parse id {}", id.as_ref());
                    None
                } else {
                    Some(decoded)
                }
            })
            .collect();

        if targets.is_empty() {
            return Ok(String::new());
        }

        let plural_names = self.discovery.plural_names().await?;
        let extra_env = self.config.extra_env_pairs()?;
        let mut outputs = Vec::new();

        for target in targets {
            let Some(plural) = plural_names.get(&target.kind) else {
                warn!(
                    "Could not find resource name for kind {}; skipping delete",
                    target.kind
                );
                continue;
            };

            let mut invocation = Invocation::new(["--kubeconfig"])
                .arg(self.kubeconfig_arg())
                .arg("--ignore-not-found=true")
                .arg("--wait=false")
                .arg("delete")
                .arg(plural)
                .arg(&target.name)
                .envs(extra_env.clone());
            if !target.is_cluster_scoped() {
                invocation = invocation.arg("-n").arg(&target.namespace);
            }

            let output = self.runner.run(&invocation).await?;
            let output = output.into_result(invocation.command_line(&self.runner.program()))?;
            outputs.push(String::from_utf8_lossy(&output).trim().to_string());
        }

        Ok(outputs.join("\n"))
    }
}
