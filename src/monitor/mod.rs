pub mod data;
pub mod history;

use chrono::Local;
use csv::Writer;
use data::HistoryRecord;
use history::HistoryBuffer;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ReadingSource;
use crate::config::Config;
use crate::mock::MockGenerator;
use crate::reading::{Reading, Source, Verdict};

/// Timing for one reading monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration, // time between polls, first poll is immediate
    pub mock_delay: Duration,    // pause before a mock reading replaces a failed poll
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            mock_delay: Duration::ZERO,
        }
    }
}

impl From<&Config> for MonitorConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
            mock_delay: config.mock_delay,
        }
    }
}

/// Everything the presentation layer shows for one monitor.
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// `None` until the first poll completes.
    pub current: Option<Reading>,
    pub verdict: Option<Verdict>,
    pub source: Source,
    pub history: HistoryBuffer,
    pub live_polls: u64,
    pub mock_polls: u64,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            current: None,
            verdict: None,
            source: Source::Mock,
            history: HistoryBuffer::new(),
            live_polls: 0,
            mock_polls: 0,
        }
    }
}

impl MonitorState {
    pub fn polls(&self) -> u64 {
        self.live_polls + self.mock_polls
    }

    fn adopt(&mut self, reading: Reading, source: Source) {
        match source {
            Source::Live => self.live_polls += 1,
            Source::Mock => self.mock_polls += 1,
        }
        self.verdict = Some(reading.verdict());
        self.history.push(reading.clone(), source);
        self.current = Some(reading);
        self.source = source;
    }
}

/// Poll-and-replace loop for one reading widget. Owns its own state.
pub struct ReadingMonitor<S> {
    source: S,
    generator: MockGenerator,
    config: MonitorConfig,
    state: MonitorState,
}

impl<S: ReadingSource> ReadingMonitor<S> {
    pub fn new(source: S, generator: MockGenerator, config: MonitorConfig) -> Self {
        Self {
            source,
            generator,
            config,
            state: MonitorState::default(),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Fetch one reading, falling back to mock data on any backend failure.
    pub async fn poll_once(&mut self) -> &MonitorState {
        let first_poll = self.state.polls() == 0;

        let (reading, source) = match self.source.fetch().await {
            Ok(reading) => {
                if first_poll || self.state.source == Source::Mock {
                    info!("Live readings available from backend");
                }
                (reading, Source::Live)
            }
            Err(e) => {
                if first_poll || self.state.source == Source::Live {
                    warn!("Backend unavailable, switching to mock data: {}", e);
                } else {
                    debug!("Backend still unavailable: {}", e);
                }
                if !self.config.mock_delay.is_zero() {
                    tokio::time::sleep(self.config.mock_delay).await;
                }
                (self.generator.next_reading(), Source::Mock)
            }
        };

        self.state.adopt(reading, source);
        &self.state
    }

    /// Poll on a fixed interval until `cancel` fires, calling `on_update`
    /// after every adopted reading. An in-flight poll is dropped on cancel.
    pub async fn run<F>(mut self, cancel: CancellationToken, mut on_update: F) -> MonitorState
    where
        F: FnMut(&MonitorState),
    {
        let period = self.config.poll_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting reading monitor, polling every {:?}", period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let completed = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = self.poll_once() => true,
            };
            if !completed {
                debug!("Discarding in-flight poll on shutdown");
                break;
            }
            on_update(&self.state);
        }

        info!(
            "Reading monitor stopped after {} polls ({} live, {} mock)",
            self.state.polls(),
            self.state.live_polls,
            self.state.mock_polls
        );
        self.state
    }
}

/// Write the history buffer to a timestamped CSV file inside `dir`.
pub fn export_history(history: &HistoryBuffer, dir: &Path) -> io::Result<PathBuf> {
    let file_name = Local::now()
        .format("history_%Y-%m-%d_%H-%M-%S.csv")
        .to_string();

    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let file = File::create(&path)?;
    let mut writer = Writer::from_writer(file);
    for entry in history.iter() {
        writer.serialize(HistoryRecord::from(entry))?;
    }
    writer.flush()?;

    info!("History of {} readings saved to {}", history.len(), path.display());
    Ok(path)
}
