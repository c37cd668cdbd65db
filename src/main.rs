use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use ceronix_monitor::backend::L293dClient;
use ceronix_monitor::config::Config;
use ceronix_monitor::detection::{Detector, UploadError};
use ceronix_monitor::mock::MockGenerator;
use ceronix_monitor::monitor::{self, MonitorConfig, ReadingMonitor};
use ceronix_monitor::report;

const USAGE: &str = "usage: ceronix-monitor [monitor | detect <image> | scratch <image>]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // A bad config still gets logged, into the default log directory
    let loaded = Config::from_env();
    let log_dir = match &loaded {
        Ok(config) => config.log_dir.clone(),
        Err(_) => Config::default().log_dir,
    };

    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = setup_logging(&log_dir);
    info!("Starting application");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match loaded {
        Ok(config) => run_command(&config, &args).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
        eprintln!("Error: {}", e);
    }

    info!("Application shutting down");
    result
}

async fn run_command(config: &Config, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match args.first().map(String::as_str) {
        None | Some("monitor") => run_monitor(config).await,
        Some("detect") => run_detection(Detector::labels(config)?, args.get(1)).await,
        Some("scratch") => run_detection(Detector::scratches(config)?, args.get(1)).await,
        Some(other) => {
            eprintln!("{}", USAGE);
            Err(format!("unknown command '{}'", other).into())
        }
    }
}

async fn run_monitor(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = L293dClient::new(
        &config.backend_url,
        &config.reading_path,
        config.reading_timeout,
        config.schema,
    )?;
    info!("Polling {} every {:?}", client.url(), config.poll_interval);

    let generator = MockGenerator::new(config.schema, config.scenario);
    let monitor = ReadingMonitor::new(client, generator, MonitorConfig::from(config));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping monitor");
        }
        shutdown.cancel();
    });

    let state = monitor
        .run(cancel, |state| println!("{}", report::summary_line(state)))
        .await;

    println!();
    print!("{}", report::render_monitor(&state));

    if config.export_history && !state.history.is_empty() {
        match monitor::export_history(&state.history, &config.log_dir) {
            Ok(path) => println!("History saved to: {}", path.display()),
            Err(e) => warn!("Failed to export history: {}", e),
        }
    }
    Ok(())
}

async fn run_detection(
    detector: Detector,
    image: Option<&String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = image.map(PathBuf::from);
    match detector.submit(image.as_deref()).await {
        Ok(outcome) => {
            print!("{}", report::render_detection(detector.kind(), &outcome));
            Ok(())
        }
        Err(UploadError::NoFileSelected) => {
            eprintln!("{}\n{}", UploadError::NoFileSelected, USAGE);
            Err(Box::new(UploadError::NoFileSelected))
        }
        Err(e) => Err(Box::new(e)),
    }
}

fn setup_logging(log_dir: &Path) -> WorkerGuard {
    // Set up file-based logging with daily rotation
    let file_appender = rolling::daily(log_dir, "ceronix.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(non_blocking)
        .with_ansi(false) // Disable ANSI colors in log files
        .with_level(true)
        .init();

    guard
}
