use serde::Serialize;

use super::history::HistoryEntry;
use crate::reading::{Reading, Source, Verdict};

/// One CSV row of exported history. Fields of the other schema stay empty.
#[derive(Debug, Serialize)]
pub struct HistoryRecord {
    pub timestamp: String, // local RFC 3339, whole seconds
    pub source: Source,
    pub verdict: Verdict,
    pub supply_v: Option<f64>,
    pub output_v: Option<f64>,
    pub voltage_drop: Option<f64>,
    pub current: Option<f64>,
    pub temp: Option<f64>,
    pub v1: Option<f64>,
    pub v2: Option<f64>,
    pub status: Option<String>,
    pub legit: Option<bool>,
}

impl From<&HistoryEntry> for HistoryRecord {
    fn from(entry: &HistoryEntry) -> Self {
        let mut record = HistoryRecord {
            timestamp: entry.timestamp.to_rfc3339(),
            source: entry.source,
            verdict: entry.reading.verdict(),
            supply_v: None,
            output_v: None,
            voltage_drop: None,
            current: None,
            temp: None,
            v1: None,
            v2: None,
            status: None,
            legit: None,
        };
        match &entry.reading {
            Reading::Chip(chip) => {
                record.supply_v = Some(chip.supply_v);
                record.output_v = chip.output_v;
                record.voltage_drop = Some(chip.voltage_drop);
                record.current = Some(chip.current);
                record.temp = Some(chip.temp);
            }
            Reading::Motor(motor) => {
                record.v1 = Some(motor.v1);
                record.v2 = Some(motor.v2);
                record.status = Some(motor.status.clone());
                record.legit = Some(motor.legit);
            }
        }
        record
    }
}
