use crate::metrics::RunStats;

pub(crate) struct SummaryStats {
    pub(crate) success_rate_x100: u64,
    pub(crate) achieved_qps_x100: u64,
    pub(crate) avg_latency_ms: u64,
    pub(crate) min_latency_ms: u64,
    pub(crate) max_latency_ms: u64,
}

pub(crate) fn compute_summary_stats(stats: &RunStats, duration_secs: u64) -> SummaryStats {
    let total = stats.total_requests;

    let success_rate_x100 = if total > 0 {
        u128::from(stats.total_successes)
            .saturating_mul(10_000)
            .checked_div(u128::from(total))
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(u64::MAX)
    } else {
        0
    };

    // Achieved aggregate QPS is total over the configured duration, not the
    // wall clock, so a cancelled run reports against the same denominator.
    let achieved_qps_x100 = u128::from(total)
        .saturating_mul(100)
        .checked_div(u128::from(duration_secs.max(1)))
        .and_then(|value| u64::try_from(value).ok())
        .unwrap_or(u64::MAX);

    let min_latency_ms = if total > 0 { stats.min_latency_ms } else { 0 };

    SummaryStats {
        success_rate_x100,
        achieved_qps_x100,
        avg_latency_ms: stats.avg_latency_ms(),
        min_latency_ms,
        max_latency_ms: stats.max_latency_ms,
    }
}

pub(crate) fn build_summary_lines(
    stats: &RunStats,
    summary: &SummaryStats,
    duration_secs: u64,
) -> Vec<String> {
    let mut lines = vec![
        format!("Duration: {}s", duration_secs),
        format!("Total Requests: {}", stats.total_requests),
        format!(
            "Successful: {} ({}.{:02}%)",
            stats.total_successes,
            summary.success_rate_x100.checked_div(100).unwrap_or(0),
            summary.success_rate_x100.checked_rem(100).unwrap_or(0),
        ),
        format!("Errors: {}", stats.total_errors),
        format!("Health Requests: {}", stats.health_count),
        format!("Order Requests: {}", stats.order_count),
        format!(
            "Achieved QPS: {}.{:02}",
            summary.achieved_qps_x100.checked_div(100).unwrap_or(0),
            summary.achieved_qps_x100.checked_rem(100).unwrap_or(0),
        ),
        format!("Avg Latency: {}ms", summary.avg_latency_ms),
        format!(
            "Min/Max Latency: {}ms / {}ms",
            summary.min_latency_ms, summary.max_latency_ms
        ),
        "Status Codes:".to_owned(),
    ];

    for (label, count) in &stats.status_histogram {
        lines.push(format!("  {}: {}", label, count));
    }

    lines
}

pub(crate) fn print_summary(stats: &RunStats, summary: &SummaryStats, duration_secs: u64) {
    for line in build_summary_lines(stats, summary, duration_secs) {
        println!("{}", line);
    }
}
