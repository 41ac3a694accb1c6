//! Freshness report command

use std::path::Path;

use colored::Colorize;
use memsync_core::{FreshnessReport, FreshnessStatus, SyncConfig, check_freshness};

use crate::error::{EXIT_SUCCESS, Result};

/// Run the validate command
///
/// Reporting only; drift never changes the exit code.
pub fn run_validate(root: &Path, json: bool) -> Result<u8> {
    let config = SyncConfig::load(root)?;
    let report = check_freshness(root, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(EXIT_SUCCESS)
}

fn print_report(report: &FreshnessReport) {
    println!(
        "{} ({:.1}ms)",
        "Memory Freshness Report".bold(),
        report.duration_ms
    );
    println!("  Total:    {}", report.total);
    println!("  In-sync:  {}", report.in_sync.to_string().green());
    println!("  Stale:    {}", report.stale.to_string().yellow());
    println!("  Missing:  {}", report.missing.to_string().yellow());
    println!("  Orphaned: {}", report.orphaned.to_string().red());

    if !report.is_healthy() {
        println!();
        for detail in report.problems() {
            let label = format!("[{}]", detail.status.as_str());
            let label = match detail.status {
                FreshnessStatus::Orphaned => label.red(),
                _ => label.yellow(),
            };
            println!("  {} {}", label, detail.name);
        }
    }
}
