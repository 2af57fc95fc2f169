//! Display formatting for CLI output

use console::style;
use kubeapply_core::Manifest;
use kubeapply_kube::{ApiResourceInfo, ApplyResult, DiffResult, Operation, sanitize_diff};

/// Print manifests in apply order with their content hashes
pub fn print_ordered(manifests: &[Manifest]) {
    for (index, manifest) in manifests.iter().enumerate() {
        println!(
            "{:06} {} {}",
            index,
            manifest.resource_id,
            style(short_hash(&manifest.content_hash)).dim()
        );
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

/// Print the apply summary table
pub fn print_apply_results(results: &[ApplyResult]) {
    if results.is_empty() {
        println!("{} No resources applied", style("✓").green().bold());
        return;
    }

    println!("{}", kubeapply_kube::apply::results_table(results));

    let created = results.iter().filter(|r| r.is_created()).count();
    let updated = results.iter().filter(|r| r.is_updated()).count();
    println!(
        "{} {} created, {} updated, {} unchanged",
        style("✓").green().bold(),
        created,
        updated,
        results.len() - created - updated
    );
}

/// Print the diff summary table, followed by every raw diff unless
/// `summary_only` is set
pub fn print_diff_results(results: &[DiffResult], summary_only: bool, sanitize: bool) {
    if results.is_empty() {
        println!("{} No diffs found", style("✓").green().bold());
        return;
    }

    println!("{}", style("Diffs summary:").bold());
    println!("{}", kubeapply_kube::diff::results_table(results));

    if summary_only {
        return;
    }

    println!();
    println!("{}", style("Raw diffs:").bold());
    for result in results {
        print_raw_diff(result, sanitize);
    }
}

/// Print one resource's diff with colored change lines
pub fn print_raw_diff(result: &DiffResult, sanitize: bool) {
    let header = match result.operation {
        Operation::Create => style(format!("+ {}", result.name)).green(),
        Operation::Delete => style(format!("- {}", result.name)).red(),
        Operation::Update => style(format!("~ {}", result.name)).yellow(),
    };
    println!("{}", header.bold());

    let raw = if sanitize {
        sanitize_diff(&result.raw_diff)
    } else {
        result.raw_diff.clone()
    };
    print_diff_text(&raw);
}

/// Print unified diff text, coloring added and removed lines
pub fn print_diff_text(text: &str) {
    for line in text.lines().filter(|l| !l.is_empty()) {
        if line.starts_with('+') {
            println!("{}", style(line).green());
        } else if line.starts_with('-') {
            println!("{}", style(line).red());
        } else if line.starts_with("@@") {
            println!("{}", style(line).cyan());
        } else {
            println!("{}", line);
        }
    }
}

/// Print discovered API resources in the kubectl column layout
pub fn print_api_resources(resources: &[ApiResourceInfo]) {
    println!(
        "{:<40} {:<15} {:<40} {:<11} {}",
        "NAME", "SHORTNAMES", "APIVERSION", "NAMESPACED", "KIND"
    );
    for resource in resources {
        println!(
            "{:<40} {:<15} {:<40} {:<11} {}",
            resource.name,
            resource.short_names.join(","),
            resource.api_version,
            resource.namespaced,
            resource.kind
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_hash("abc"), "abc");
    }
}
