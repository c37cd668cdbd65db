//! Threshold-based authenticity check for five-field chip readings.
//!
//! Four fields are range-checked; two or more failures mark the chip as
//! likely counterfeit. Output voltage is range-checked for display only.

use crate::reading::{ChipReading, Verdict};

pub const SUPPLY_V_MIN: f64 = 10.0;
pub const SUPPLY_V_MAX: f64 = 14.0;
pub const VOLTAGE_DROP_MAX: f64 = 1.0;
pub const CURRENT_MIN: f64 = 0.05;
pub const CURRENT_MAX: f64 = 2.0;
pub const TEMP_MAX: f64 = 70.0;
pub const OUTPUT_V_MIN: f64 = 10.5;
pub const OUTPUT_V_MAX: f64 = 12.5;

/// Number of failed checks at which the verdict flips to FAKE.
pub const FAKE_ISSUE_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    SupplyVoltage,
    VoltageDrop,
    Current,
    Temperature,
}

impl Check {
    pub fn label(self) -> &'static str {
        match self {
            Check::SupplyVoltage => "supply voltage",
            Check::VoltageDrop => "voltage drop",
            Check::Current => "current",
            Check::Temperature => "temperature",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub issues: Vec<Check>,
    /// `None` when the reading carried no output voltage.
    pub output_in_range: Option<bool>,
    pub verdict: Verdict,
}

/// Run every check and report which ones failed.
pub fn inspect(reading: &ChipReading) -> Inspection {
    let mut issues = Vec::new();

    if reading.supply_v < SUPPLY_V_MIN || reading.supply_v > SUPPLY_V_MAX {
        issues.push(Check::SupplyVoltage);
    }
    if reading.voltage_drop > VOLTAGE_DROP_MAX {
        issues.push(Check::VoltageDrop);
    }
    if reading.current < CURRENT_MIN || reading.current > CURRENT_MAX {
        issues.push(Check::Current);
    }
    if reading.temp > TEMP_MAX {
        issues.push(Check::Temperature);
    }

    let output_in_range = reading
        .output_v
        .map(|v| !(v < OUTPUT_V_MIN || v > OUTPUT_V_MAX));

    let verdict = if issues.len() >= FAKE_ISSUE_THRESHOLD {
        Verdict::LikelyFake
    } else {
        Verdict::LikelyReal
    };

    Inspection { issues, output_in_range, verdict }
}

pub fn evaluate(reading: &ChipReading) -> Verdict {
    inspect(reading).verdict
}
