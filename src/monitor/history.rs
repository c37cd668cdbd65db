use chrono::{DateTime, Local, SubsecRound};
use std::collections::VecDeque;

use crate::reading::{Reading, Source};

/// Number of readings kept for charting.
pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub source: Source,
    pub reading: Reading,
}

impl HistoryEntry {
    /// Chart axis label, e.g. `14:03:27`.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Sliding window of the most recent readings, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Append a reading stamped with the given time (truncated to whole
    /// seconds), evicting the oldest entry once full.
    pub fn push_at(&mut self, reading: Reading, source: Source, at: DateTime<Local>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            timestamp: at.trunc_subsecs(0),
            source,
            reading,
        });
    }

    pub fn push(&mut self, reading: Reading, source: Source) {
        self.push_at(reading, source, Local::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::ChipReading;
    use chrono::{Duration, TimeZone, Timelike};

    fn reading(temp: f64) -> Reading {
        Reading::Chip(ChipReading {
            supply_v: 12.0,
            output_v: None,
            voltage_drop: 0.4,
            current: 0.3,
            temp,
        })
    }

    #[test]
    fn never_exceeds_capacity_and_evicts_oldest() {
        let mut history = HistoryBuffer::new();
        for i in 0..21 {
            history.push(reading(i as f64), Source::Mock);
            assert!(history.len() <= HISTORY_CAPACITY);
        }
        assert_eq!(history.len(), 20);

        let first = history.iter().next().unwrap();
        assert_eq!(first.reading, reading(1.0));
        assert_eq!(history.latest().unwrap().reading, reading(20.0));
    }

    #[test]
    fn keeps_insertion_order() {
        let mut history = HistoryBuffer::with_capacity(3);
        for i in 0..5 {
            history.push(reading(i as f64), Source::Live);
        }
        let temps: Vec<f64> = history
            .iter()
            .map(|e| match &e.reading {
                Reading::Chip(c) => c.temp,
                Reading::Motor(_) => unreachable!(),
            })
            .collect();
        assert_eq!(temps, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn timestamps_truncate_to_whole_seconds() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 14, 3, 27).unwrap()
            + Duration::milliseconds(870);
        let mut history = HistoryBuffer::new();
        history.push_at(reading(30.0), Source::Live, at);

        let entry = history.latest().unwrap();
        assert_eq!(entry.timestamp.nanosecond(), 0);
        assert_eq!(entry.time_label(), "14:03:27");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = HistoryBuffer::with_capacity(0);
        history.push(reading(1.0), Source::Mock);
        history.push(reading(2.0), Source::Mock);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
    }
}
