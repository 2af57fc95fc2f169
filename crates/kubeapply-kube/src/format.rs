//! Plain-text formatting shared by apply and diff reports

/// Render rows as a left-aligned table with a dashed rule above, below, and
/// under the header
pub fn text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format_row(headers.iter().map(|h| h.to_uppercase()), &widths));
    out.push('\n');
    out.push_str(&rule);
    for row in rows {
        out.push('\n');
        out.push_str(&format_row(row.iter().cloned(), &widths));
    }
    out.push('\n');
    out.push_str(&rule);
    out
}

fn format_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    padded.join(" | ").trim_end().to_string()
}

/// Prefix every non-empty line with `> ` so tool output stands out in logs
pub fn prettify_output(output: &str) -> String {
    output
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_table_alignment() {
        let table = text_table(
            &["Op", "Name"],
            &[
                vec!["+".to_string(), "frontend".to_string()],
                vec!["~".to_string(), "db".to_string()],
            ],
        );
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "---+---------");
        assert_eq!(lines[1], "OP | NAME");
        assert_eq!(lines[3], "+  | frontend");
        assert_eq!(lines[4], "~  | db");
    }

    #[test]
    fn test_text_table_empty() {
        let table = text_table(&["Name"], &[]);
        assert_eq!(table, "----\nNAME\n----\n----");
    }

    #[test]
    fn test_prettify_output() {
        assert_eq!(
            prettify_output("\nline one\n\n  \nline two\n"),
            "> line one\n> line two"
        );
        assert_eq!(prettify_output("   "), "");
    }
}
