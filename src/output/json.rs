//! JSON serialization for latency reports.

use crate::result::LatencyReport;

/// Serialize a LatencyReport to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (a non-finite average, for example).
pub fn to_json(report: &LatencyReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a LatencyReport to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty(report: &LatencyReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{LatencyEntry, ProbeKind};
    use crate::statistics::Stat;

    fn make_report() -> LatencyReport {
        let out: Stat = [120, 180].into_iter().collect();
        let inb: Stat = [90, 110].into_iter().collect();
        LatencyReport {
            kind: ProbeKind::SharedMemory,
            clock_hz: 100_000_000,
            ns_per_tick: 10.0,
            iterations: 2,
            entries: vec![LatencyEntry::new(16, &out, &inb, 10.0)],
            runtime_secs: 0.25,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&make_report()).unwrap();
        assert!(json.contains("\"kind\":\"SharedMemory\""));
        assert!(json.contains("\"avg_ns\":1500.0"));
        assert!(!json.contains("warnings"));
    }

    #[test]
    fn test_to_json_pretty_parses_back() {
        let json = to_json_pretty(&make_report()).unwrap();
        assert!(json.contains('\n'));
        let back: LatencyReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries, make_report().entries);
    }
}
