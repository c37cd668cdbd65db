//! Synthetic readings used while the live backend is unreachable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::reading::{ChipReading, MotorReading, Reading, ReadingSchema};

/// Which kind of synthetic reading the generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockScenario {
    /// Every field inside its healthy band.
    #[default]
    Healthy,
    /// Voltage drop and temperature far out of range; always evaluates FAKE.
    Anomalous,
    /// Healthy or anomalous with equal probability, decided per reading.
    CoinFlip,
}

impl std::str::FromStr for MockScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "healthy" => Ok(MockScenario::Healthy),
            "anomalous" | "fake" => Ok(MockScenario::Anomalous),
            "coin-flip" | "coinflip" | "random" => Ok(MockScenario::CoinFlip),
            other => Err(format!("unknown mock scenario '{}'", other)),
        }
    }
}

pub struct MockGenerator {
    scenario: MockScenario,
    schema: ReadingSchema,
    rng: StdRng,
}

impl MockGenerator {
    pub fn new(schema: ReadingSchema, scenario: MockScenario) -> Self {
        Self { scenario, schema, rng: StdRng::from_os_rng() }
    }

    /// Deterministic generator for tests and reproducible demos.
    pub fn with_seed(schema: ReadingSchema, scenario: MockScenario, seed: u64) -> Self {
        Self { scenario, schema, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn scenario(&self) -> MockScenario {
        self.scenario
    }

    pub fn next_reading(&mut self) -> Reading {
        let anomalous = match self.scenario {
            MockScenario::Healthy => false,
            MockScenario::Anomalous => true,
            MockScenario::CoinFlip => self.rng.random_bool(0.5),
        };
        match self.schema {
            ReadingSchema::Full => Reading::Chip(chip_reading(&mut self.rng, anomalous)),
            ReadingSchema::Motor => Reading::Motor(motor_reading(&mut self.rng, anomalous)),
        }
    }
}

fn chip_reading<R: Rng>(rng: &mut R, anomalous: bool) -> ChipReading {
    let supply_v = 12.0 + rng.random_range(-0.1..0.1);
    let output_v = 11.5 + rng.random_range(-0.15..0.15);
    let current = 0.3 + rng.random_range(0.0..0.2);

    let (voltage_drop, temp) = if anomalous {
        (rng.random_range(1.5..2.0), rng.random_range(85.0..95.0))
    } else {
        (0.4 + rng.random_range(0.0..0.1), 30.0 + rng.random_range(0.0..5.0))
    };

    ChipReading { supply_v, output_v: Some(output_v), voltage_drop, current, temp }
}

fn motor_reading<R: Rng>(rng: &mut R, anomalous: bool) -> MotorReading {
    if anomalous {
        MotorReading {
            v1: rng.random_range(6.0..8.0),
            v2: rng.random_range(6.0..8.0),
            status: "FAULT".to_string(),
            legit: false,
        }
    } else {
        MotorReading {
            v1: 11.5 + rng.random_range(-0.15..0.15),
            v2: 11.5 + rng.random_range(-0.15..0.15),
            status: "OK".to_string(),
            legit: true,
        }
    }
}
