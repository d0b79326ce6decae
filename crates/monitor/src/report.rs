//! Periodic summary line

use pairwatch_core::FeedSummary;
use pairwatch_feed::FeedStats;

/// One-line description of the feed, for the periodic summary log.
pub fn summary_line(summary: &FeedSummary, stats: &FeedStats) -> String {
    let updated = stats
        .last_update
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "{} pairs ({} honeypots, {} high tax) | safe {} / caution {} / high {} / unknown {} | \
         snapshots {} ok, {} failed | events {}, dropped {} | updated {}",
        summary.total_count,
        summary.honeypot_count,
        summary.high_tax_count,
        summary.safe_count,
        summary.caution_count,
        summary.high_count,
        summary.unknown_count,
        stats.snapshot_loads,
        stats.snapshot_failures,
        stats.events_applied,
        stats.malformed_dropped,
        updated,
    )
}
