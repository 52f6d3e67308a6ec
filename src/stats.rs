//! Index statistics and health overview.
//!
//! Gives a quick picture of what's indexed: record counts by status,
//! per-jurisdiction breakdowns, and the most recent usable date. Used by
//! `gzt stats` to confirm that ingestion is keeping up.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::Config;
use crate::index::{DocumentIndex, StatusCounts};

/// Aggregate view of one index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub total: usize,
    pub totals: StatusCounts,
    pub latest_date: Option<NaiveDate>,
    pub by_jurisdiction: Vec<(String, StatusCounts)>,
}

pub fn collect_stats(index: &DocumentIndex) -> IndexStats {
    let counts = index.status_counts();
    let mut totals = StatusCounts::default();
    for c in counts.values() {
        totals.raw += c.raw;
        totals.summary_ready += c.summary_ready;
        totals.legacy += c.legacy;
        totals.usable += c.usable;
    }

    IndexStats {
        total: index.records().len(),
        totals,
        latest_date: index.latest_date(None),
        by_jurisdiction: counts.into_iter().collect(),
    }
}

/// Run the stats command: load the index and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let path = &config.index.path;
    let index = DocumentIndex::load(path)
        .with_context(|| format!("Failed to load index: {}", path.display()))?;
    let stats = collect_stats(&index);

    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("Gazette Harness Index Stats");
    println!("===========================");
    println!();
    println!("  Index:         {}", path.display());
    println!("  Size:          {}", format_bytes(file_size));
    println!();
    println!("  Records:       {}", stats.total);
    println!("  Summary ready: {}", stats.totals.summary_ready);
    println!("  Raw:           {}", stats.totals.raw);
    println!("  Legacy:        {}", stats.totals.legacy);
    println!(
        "  Usable:        {} / {} ({}%)",
        stats.totals.usable,
        stats.total,
        if stats.total > 0 {
            (stats.totals.usable * 100) / stats.total
        } else {
            0
        }
    );
    println!(
        "  Latest date:   {}",
        stats
            .latest_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    if !stats.by_jurisdiction.is_empty() {
        println!();
        println!("  By jurisdiction:");
        println!(
            "  {:<16} {:>6} {:>8} {:>8} {:>8}",
            "JURISDICTION", "RAW", "READY", "LEGACY", "USABLE"
        );
        println!("  {}", "-".repeat(50));

        for (jurisdiction, c) in &stats.by_jurisdiction {
            let name = if jurisdiction.is_empty() {
                "(none)"
            } else {
                jurisdiction.as_str()
            };
            println!(
                "  {:<16} {:>6} {:>8} {:>8} {:>8}",
                name, c.raw, c.summary_ready, c.legacy, c.usable
            );
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
