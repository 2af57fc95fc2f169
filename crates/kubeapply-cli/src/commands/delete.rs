//! Delete command - remove resources by identifier

use console::style;
use kubeapply_kube::OrderedClient;

use crate::error::Result;

/// Run the delete command
pub async fn run(client: &OrderedClient, ids: &[String]) -> Result<()> {
    let output = client.delete(ids).await?;
    if output.is_empty() {
        println!("{} Nothing deleted", style("✓").green().bold());
    } else {
        println!("{}", output);
    }
    Ok(())
}
