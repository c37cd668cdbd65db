use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-field electrical snapshot of an L293D under test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChipReading {
    pub supply_v: f64, // volts
    /// Volts. Display only, and may be missing from a live payload.
    #[serde(default)]
    pub output_v: Option<f64>,
    pub voltage_drop: f64, // volts
    pub current: f64,      // amps
    pub temp: f64,         // degrees celsius
}

/// Two-channel output reading reported by the motor-driver rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorReading {
    pub v1: f64,
    pub v2: f64,
    pub status: String,
    pub legit: bool,
}

/// Which payload shape the reading endpoint is expected to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingSchema {
    #[default]
    Full,
    Motor,
}

impl std::str::FromStr for ReadingSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "l293d" | "5" => Ok(ReadingSchema::Full),
            "motor" | "2" => Ok(ReadingSchema::Motor),
            other => Err(format!("unknown reading schema '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Chip(ChipReading),
    Motor(MotorReading),
}

impl Reading {
    pub fn schema(&self) -> ReadingSchema {
        match self {
            Reading::Chip(_) => ReadingSchema::Full,
            Reading::Motor(_) => ReadingSchema::Motor,
        }
    }

    /// Classify the reading. The motor rig reports its own `legit` flag.
    pub fn verdict(&self) -> Verdict {
        match self {
            Reading::Chip(chip) => crate::evaluator::evaluate(chip),
            Reading::Motor(motor) => Verdict::from_legit(motor.legit),
        }
    }
}

impl From<ChipReading> for Reading {
    fn from(chip: ChipReading) -> Self {
        Reading::Chip(chip)
    }
}

impl From<MotorReading> for Reading {
    fn from(motor: MotorReading) -> Self {
        Reading::Motor(motor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "Likely REAL")]
    LikelyReal,
    #[serde(rename = "Likely FAKE")]
    LikelyFake,
}

impl Verdict {
    pub fn from_legit(legit: bool) -> Self {
        if legit { Verdict::LikelyReal } else { Verdict::LikelyFake }
    }

    pub fn is_fake(self) -> bool {
        self == Verdict::LikelyFake
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::LikelyReal => f.write_str("Likely REAL"),
            Verdict::LikelyFake => f.write_str("Likely FAKE"),
        }
    }
}

/// Where the currently displayed reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Mock,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Live => f.write_str("live"),
            Source::Mock => f.write_str("mock"),
        }
    }
}
