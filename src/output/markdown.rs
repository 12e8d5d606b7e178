//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a crawl, including
//! run information, per-host counts, downloaded URLs and failures.

use crate::output::summary::CrawlSummary;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a crawl to `output_path`
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let report = &summary.report;
    let mut md = String::new();

    md.push_str("# Ripple Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed_url));
    md.push_str(&format!("- **Max Depth**: {}\n", summary.max_depth));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration_seconds()
    ));
    md.push_str(&format!("- **Status**: {}\n\n", summary.status));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Downloaded**: {}\n", report.success_count()));
    md.push_str(&format!("- **Failed**: {}\n", report.error_count()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        report.success_rate()
    ));

    let hosts = summary.host_breakdown();
    if !hosts.is_empty() {
        md.push_str("## Hosts\n\n");
        md.push_str("| Host | Downloaded | Failed |\n");
        md.push_str("|------|------------|--------|\n");
        for (host, counts) in &hosts {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                host, counts.downloaded, counts.failed
            ));
        }
        md.push('\n');
    }

    if !report.downloaded.is_empty() {
        md.push_str("## Downloaded URLs\n\n");
        for url in &report.downloaded {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    let errors = summary.sorted_errors();
    if !errors.is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");
        for (url, message) in errors {
            md.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(url),
                escape_cell(&message)
            ));
        }
        md.push('\n');
    }

    md
}

/// Escapes characters that would break a markdown table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
