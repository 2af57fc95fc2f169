//! api-resources command - show the kind to resource name mapping

use kubeapply_kube::OrderedClient;

use crate::display;
use crate::error::Result;

/// Run the api-resources command
pub async fn run(client: &OrderedClient) -> Result<()> {
    let resources = client.discovery().api_resources().await?;
    display::print_api_resources(&resources);
    Ok(())
}
