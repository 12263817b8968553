//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::result::{DirectionSummary, LatencyReport, ProbeKind};

/// Format a LatencyReport for human-readable terminal output.
pub fn format_report(report: &LatencyReport) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str(&format!("amp-latency: {}\n", title(report.kind)));
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!(
        "  Iterations: {} per size\n",
        report.iterations
    ));
    output.push_str(&format!(
        "  Clock:      {} Hz ({:.2} ns/tick)\n",
        report.clock_hz, report.ns_per_tick
    ));
    output.push('\n');

    for warning in &report.warnings {
        let line = format!("\u{26A0} {}", warning.description());
        if warning.is_critical() {
            output.push_str(&format!("  {}\n", line.red().bold()));
        } else {
            output.push_str(&format!("  {}\n", line.yellow()));
        }
    }
    if !report.warnings.is_empty() {
        output.push('\n');
    }

    output.push_str(&format!(
        "  {:>6}  {:<26}  {:<26}\n",
        "size".bold(),
        "outbound [min, max] avg".bold(),
        "inbound [min, max] avg".bold()
    ));
    for entry in &report.entries {
        output.push_str(&format!(
            "  {:>6}  {:<26}  {:<26}\n",
            entry.size,
            format_direction(&entry.outbound),
            format_direction(&entry.inbound)
        ));
    }
    output.push('\n');

    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!(
        "{} round trips in {:.2}s. Min/max in ticks, average in ns.\n",
        report.total_round_trips(),
        report.runtime_secs
    ));

    output
}

fn title(kind: ProbeKind) -> &'static str {
    match kind {
        ProbeKind::SharedMemory => "shared memory round trip",
        ProbeKind::Ipi => "IPI round trip",
    }
}

fn format_direction(summary: &DirectionSummary) -> String {
    if summary.count == 0 {
        return "-".dimmed().to_string();
    }
    format!(
        "[{}, {}] {} ns",
        summary.min_ticks,
        summary.max_ticks,
        format!("{:.0}", summary.avg_ns).green()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preflight::PreflightWarning;
    use crate::result::LatencyEntry;
    use crate::statistics::Stat;

    fn make_report(warnings: Vec<PreflightWarning>) -> LatencyReport {
        let out: Stat = [100, 300].into_iter().collect();
        let inb: Stat = [40, 60].into_iter().collect();
        LatencyReport {
            kind: ProbeKind::SharedMemory,
            clock_hz: 100_000_000,
            ns_per_tick: 10.0,
            iterations: 2,
            entries: vec![LatencyEntry::new(64, &out, &inb, 10.0)],
            runtime_secs: 0.5,
            warnings,
        }
    }

    #[test]
    fn test_format_report_lists_sizes() {
        colored::control::set_override(false);
        let output = format_report(&make_report(Vec::new()));
        assert!(output.contains("shared memory round trip"));
        assert!(output.contains("[100, 300] 2000 ns"));
        assert!(output.contains("[40, 60] 500 ns"));
        assert!(output.contains("2 round trips"));
    }

    #[test]
    fn test_format_report_shows_warnings() {
        colored::control::set_override(false);
        let output = format_report(&make_report(vec![PreflightWarning::ClockStalled {
            counter: 2,
            polls: 10,
        }]));
        assert!(output.contains("did not advance"));
    }
}
