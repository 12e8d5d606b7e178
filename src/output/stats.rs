//! Console statistics for a finished crawl

use crate::output::summary::CrawlSummary;

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The crawl summary to display
pub fn print_statistics(summary: &CrawlSummary) {
    println!("{}", format_statistics(summary));
}

/// Formats the console statistics block
pub fn format_statistics(summary: &CrawlSummary) -> String {
    let report = &summary.report;
    let mut out = String::new();

    out.push_str("=== Crawl Statistics ===\n\n");

    out.push_str("Overview:\n");
    out.push_str(&format!("  Seed: {}\n", summary.seed_url));
    out.push_str(&format!("  Max depth: {}\n", summary.max_depth));
    out.push_str(&format!("  Status: {}\n", summary.status));
    out.push_str(&format!(
        "  Duration: {:.2}s\n",
        summary.duration_seconds()
    ));
    out.push_str(&format!("  Downloaded: {}\n", report.success_count()));
    out.push_str(&format!("  Failed: {}\n\n", report.error_count()));

    let hosts = summary.host_breakdown();
    if !hosts.is_empty() {
        out.push_str(&format!("Hosts ({}):\n", hosts.len()));
        // Sort hosts by downloads (descending), then name
        let mut host_counts: Vec<_> = hosts.iter().collect();
        host_counts.sort_by(|a, b| b.1.downloaded.cmp(&a.1.downloaded).then(a.0.cmp(b.0)));
        for (host, counts) in host_counts {
            out.push_str(&format!(
                "  {}: {} downloaded, {} failed\n",
                host, counts.downloaded, counts.failed
            ));
        }
        out.push('\n');
    }

    let errors = summary.sorted_errors();
    if !errors.is_empty() {
        out.push_str("Errors:\n");
        for (url, message) in errors {
            out.push_str(&format!("  {}: {}\n", url, message));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} URLs downloaded)",
        report.success_rate(),
        report.success_count(),
        report.total()
    ));
    out
}
