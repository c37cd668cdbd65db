//! Plain-text rendering of widget state for the terminal.

use std::fmt::Write;

use crate::detection::{DetectionOutcome, DetectorKind, ImageRef};
use crate::evaluator;
use crate::monitor::MonitorState;
use crate::reading::{Reading, Source};

pub fn status_label(source: Source) -> &'static str {
    match source {
        Source::Live => "✅ Live from backend",
        Source::Mock => "⚠️ Using Mock Data",
    }
}

/// One line per poll, e.g. `[14:03:27] mock  Likely REAL  supply 12.03 V ...`.
pub fn summary_line(state: &MonitorState) -> String {
    let Some(entry) = state.history.latest() else {
        return "Checking...".to_string();
    };
    let verdict = entry.reading.verdict();
    let values = match &entry.reading {
        Reading::Chip(chip) => format!(
            "supply {:.2} V, drop {:.2} V, current {:.2} A, temp {:.1} °C",
            chip.supply_v, chip.voltage_drop, chip.current, chip.temp
        ),
        Reading::Motor(motor) => format!(
            "v1 {:.2} V, v2 {:.2} V, status {}",
            motor.v1, motor.v2, motor.status
        ),
    };
    format!(
        "[{}] {:<4}  {}  {}",
        entry.time_label(),
        entry.source.to_string(),
        verdict,
        values
    )
}

/// Full monitor panel: status, verdict, latest reading and history size.
pub fn render_monitor(state: &MonitorState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "L293D Authenticity Monitor");
    let _ = writeln!(out, "Status: {}", status_label(state.source));

    let (Some(reading), Some(verdict)) = (&state.current, state.verdict) else {
        let _ = writeln!(out, "Chip Verdict: Checking...");
        return out;
    };
    let _ = writeln!(out, "Chip Verdict: {}", verdict);
    let _ = writeln!(out, "Latest Reading");

    match reading {
        Reading::Chip(chip) => {
            let report = evaluator::inspect(chip);
            let _ = writeln!(out, "  Supply Voltage: {:.2} V", chip.supply_v);
            match (chip.output_v, report.output_in_range) {
                (Some(v), Some(false)) => {
                    let _ = writeln!(out, "  Output Voltage: {:.2} V (out of range)", v);
                }
                (Some(v), _) => {
                    let _ = writeln!(out, "  Output Voltage: {:.2} V", v);
                }
                (None, _) => {
                    let _ = writeln!(out, "  Output Voltage: n/a");
                }
            }
            let _ = writeln!(out, "  Voltage Drop : {:.2} V", chip.voltage_drop);
            let _ = writeln!(out, "  Current : {:.2} A", chip.current);
            let _ = writeln!(out, "  Temperature : {:.1} °C", chip.temp);
            if !report.issues.is_empty() {
                let names: Vec<&str> = report.issues.iter().map(|c| c.label()).collect();
                let _ = writeln!(out, "  Out of range: {}", names.join(", "));
            }
        }
        Reading::Motor(motor) => {
            let _ = writeln!(out, "  Output 1: {:.2} V", motor.v1);
            let _ = writeln!(out, "  Output 2: {:.2} V", motor.v2);
            let _ = writeln!(out, "  Status : {}", motor.status);
        }
    }

    let _ = writeln!(
        out,
        "History: {} of {} readings ({} live, {} mock polls)",
        state.history.len(),
        state.history.capacity(),
        state.live_polls,
        state.mock_polls
    );
    out
}

pub fn render_detection(kind: DetectorKind, outcome: &DetectionOutcome) -> String {
    let mut out = String::new();
    let title = match kind {
        DetectorKind::Labels => "Counterfeit Product Detector",
        DetectorKind::Scratches => "Scratch Detector",
    };
    let _ = writeln!(out, "{}", title);

    if let Some(error) = &outcome.error {
        let _ = writeln!(out, "{}", error);
    }
    match (kind, outcome.labels.is_empty()) {
        (DetectorKind::Labels, false) => {
            let _ = writeln!(out, "Detections: {}", outcome.labels.join(", "));
        }
        (DetectorKind::Labels, true) => {
            let _ = writeln!(out, "No objects detected yet");
        }
        (DetectorKind::Scratches, false) => {
            let _ = writeln!(out, "Result: {}", outcome.labels.join(", "));
        }
        (DetectorKind::Scratches, true) => {
            let _ = writeln!(out, "Upload an image to detect scratches.");
        }
    }
    match &outcome.image {
        Some(ImageRef::Remote(url)) => {
            let _ = writeln!(out, "Result image: {}", url);
        }
        Some(ImageRef::Placeholder(path)) => {
            let _ = writeln!(out, "Result image: {} (placeholder)", path.display());
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Origin;
    use crate::reading::{ChipReading, Verdict};

    fn state_with(reading: ChipReading, source: Source) -> MonitorState {
        let mut state = MonitorState::default();
        state.history.push(Reading::Chip(reading), source);
        state.verdict = Some(Reading::Chip(reading).verdict());
        state.current = Some(Reading::Chip(reading));
        state.source = source;
        state
    }

    #[test]
    fn empty_state_is_checking() {
        let state = MonitorState::default();
        assert_eq!(summary_line(&state), "Checking...");
        assert!(render_monitor(&state).contains("Chip Verdict: Checking..."));
    }

    #[test]
    fn panel_shows_verdict_and_failed_checks() {
        let state = state_with(
            ChipReading {
                supply_v: 9.0,
                output_v: Some(9.5),
                voltage_drop: 1.2,
                current: 0.3,
                temp: 30.0,
            },
            Source::Live,
        );
        assert_eq!(state.verdict, Some(Verdict::LikelyFake));

        let panel = render_monitor(&state);
        assert!(panel.contains("Status: ✅ Live from backend"));
        assert!(panel.contains("Chip Verdict: Likely FAKE"));
        assert!(panel.contains("Output Voltage: 9.50 V (out of range)"));
        assert!(panel.contains("Out of range: supply voltage, voltage drop"));
    }

    #[test]
    fn summary_mentions_source_and_verdict() {
        let state = state_with(
            ChipReading {
                supply_v: 12.0,
                output_v: None,
                voltage_drop: 0.4,
                current: 0.3,
                temp: 30.0,
            },
            Source::Mock,
        );
        let line = summary_line(&state);
        assert!(line.contains("mock"));
        assert!(line.contains("Likely REAL"));
        assert!(line.contains("supply 12.00 V"));
    }

    #[test]
    fn detection_rendering() {
        let outcome = DetectionOutcome {
            labels: vec!["Genuine".into()],
            image: Some(ImageRef::Remote("http://host/out.png?t=1".into())),
            origin: Origin::Live,
            error: None,
        };
        let text = render_detection(DetectorKind::Scratches, &outcome);
        assert!(text.contains("Result: Genuine"));
        assert!(text.contains("http://host/out.png?t=1"));

        let failed = DetectionOutcome {
            labels: vec![],
            image: None,
            origin: Origin::Fallback,
            error: Some("Upload failed: HTTP 500".into()),
        };
        let text = render_detection(DetectorKind::Labels, &failed);
        assert!(text.contains("Upload failed: HTTP 500"));
        assert!(text.contains("No objects detected yet"));
    }
}
