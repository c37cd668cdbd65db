//! Image upload widgets: the label detector and the scratch detector.
//!
//! Each [`Detector`] owns its HTTP client and a busy flag. A backend
//! failure never surfaces as an error; the caller gets a degraded
//! [`DetectionOutcome`] pointing at the local placeholder image instead.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{BackendError, DetectionResponse, VisionClient, join_url};
use crate::config::Config;

/// Shown when the scratch model found nothing.
pub const GENUINE_LABEL: &str = "Genuine";
/// Canned scratch-detector result when the backend cannot be reached.
pub const UNREACHABLE_LABEL: &str = "⚠️ Could not connect to backend";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please choose an image first")]
    NoFileSelected,

    #[error("a detection request is already in flight")]
    Busy,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Labels,
    Scratches,
}

/// What the widget shows when the backend call fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    ErrorMessage,
    CannedLabel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Remote(String),
    Placeholder(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub labels: Vec<String>,
    pub image: Option<ImageRef>,
    pub origin: Origin,
    pub error: Option<String>,
}

pub struct Detector {
    kind: DetectorKind,
    path: String,
    client: VisionClient,
    failure: FailurePolicy,
    placeholder: PathBuf,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Detector {
    pub fn new(
        kind: DetectorKind,
        client: VisionClient,
        path: &str,
        failure: FailurePolicy,
        placeholder: PathBuf,
    ) -> Self {
        Self {
            kind,
            path: path.to_string(),
            client,
            failure,
            placeholder,
            busy: AtomicBool::new(false),
        }
    }

    /// Label detector: reports an error message on failure.
    pub fn labels(config: &Config) -> Result<Self, BackendError> {
        let client = VisionClient::new(&config.backend_url, config.upload_timeout)?;
        Ok(Self::new(
            DetectorKind::Labels,
            client,
            &config.labels_path,
            FailurePolicy::ErrorMessage,
            config.placeholder_image.clone(),
        ))
    }

    /// Scratch detector: shows a canned label on failure.
    pub fn scratches(config: &Config) -> Result<Self, BackendError> {
        let client = VisionClient::new(&config.backend_url, config.upload_timeout)?;
        Ok(Self::new(
            DetectorKind::Scratches,
            client,
            &config.scratch_path,
            FailurePolicy::CannedLabel(UNREACHABLE_LABEL.to_string()),
            config.placeholder_image.clone(),
        ))
    }

    pub fn kind(&self) -> DetectorKind {
        self.kind
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, UploadError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| UploadError::Busy)
    }

    /// Upload the selected image once. No retry.
    pub async fn submit(&self, file: Option<&Path>) -> Result<DetectionOutcome, UploadError> {
        let file = file.ok_or(UploadError::NoFileSelected)?;
        let _guard = self.acquire()?;

        let bytes = tokio::fs::read(file).await.map_err(|source| UploadError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        match self.client.predict(&self.path, file_name, bytes).await {
            Ok(response) => Ok(self.live_outcome(response, Utc::now().timestamp_millis())),
            Err(e) => {
                warn!("{:?} detection failed, showing fallback: {}", self.kind, e);
                Ok(self.fallback_outcome(&e))
            }
        }
    }

    fn live_outcome(&self, response: DetectionResponse, epoch_ms: i64) -> DetectionOutcome {
        let labels = match self.kind {
            DetectorKind::Labels => response.labels,
            DetectorKind::Scratches if response.scratches.is_empty() => {
                vec![GENUINE_LABEL.to_string()]
            }
            DetectorKind::Scratches => response.scratches,
        };
        info!("{:?} detection returned {} label(s)", self.kind, labels.len());

        DetectionOutcome {
            labels,
            image: response
                .output_url
                .map(|url| ImageRef::Remote(resolve_output_url(self.client.base_url(), &url, epoch_ms))),
            origin: Origin::Live,
            error: None,
        }
    }

    fn fallback_outcome(&self, err: &BackendError) -> DetectionOutcome {
        let (labels, error) = match &self.failure {
            FailurePolicy::ErrorMessage => {
                (Vec::new(), Some(format!("Upload failed: {}", err.user_message())))
            }
            FailurePolicy::CannedLabel(label) => (vec![label.clone()], None),
        };
        DetectionOutcome {
            labels,
            image: Some(ImageRef::Placeholder(self.placeholder.clone())),
            origin: Origin::Fallback,
            error,
        }
    }
}

/// Resolve a backend-relative image path and append a `t=<epoch-ms>`
/// cache-buster.
pub fn resolve_output_url(base_url: &str, output_url: &str, epoch_ms: i64) -> String {
    let url = if output_url.starts_with("http://") || output_url.starts_with("https://") {
        output_url.to_string()
    } else {
        join_url(base_url, output_url)
    };
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, separator, epoch_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn detector(kind: DetectorKind, failure: FailurePolicy) -> Detector {
        let client = VisionClient::new("http://127.0.0.1:8000", Duration::from_secs(1)).unwrap();
        Detector::new(kind, client, "/predict", failure, PathBuf::from("assets/background.png"))
    }

    #[test]
    fn output_url_gets_cache_buster() {
        assert_eq!(
            resolve_output_url("http://127.0.0.1:8000", "/outputs/a.jpg", 1700000000000),
            "http://127.0.0.1:8000/outputs/a.jpg?t=1700000000000"
        );
        assert_eq!(
            resolve_output_url("http://127.0.0.1:8000/", "/outputs/a.jpg?v=2", 5),
            "http://127.0.0.1:8000/outputs/a.jpg?v=2&t=5"
        );
    }

    #[test]
    fn empty_scratch_result_means_genuine() {
        let d = detector(DetectorKind::Scratches, FailurePolicy::CannedLabel(UNREACHABLE_LABEL.into()));
        let outcome = d.live_outcome(DetectionResponse::default(), 1);
        assert_eq!(outcome.labels, vec![GENUINE_LABEL]);
        assert_eq!(outcome.image, None);
        assert_eq!(outcome.origin, Origin::Live);
    }

    #[test]
    fn label_detector_keeps_empty_labels() {
        let d = detector(DetectorKind::Labels, FailurePolicy::ErrorMessage);
        let outcome = d.live_outcome(
            DetectionResponse {
                output_url: Some("/out.png".into()),
                ..Default::default()
            },
            9,
        );
        assert!(outcome.labels.is_empty());
        assert_eq!(
            outcome.image,
            Some(ImageRef::Remote("http://127.0.0.1:8000/out.png?t=9".into()))
        );
    }

    #[test]
    fn fallback_follows_policy() {
        let err = BackendError::Malformed("bad".into());

        let labels = detector(DetectorKind::Labels, FailurePolicy::ErrorMessage).fallback_outcome(&err);
        assert!(labels.labels.is_empty());
        assert_eq!(labels.error.as_deref(), Some("Upload failed: malformed payload: bad"));
        assert_eq!(
            labels.image,
            Some(ImageRef::Placeholder(PathBuf::from("assets/background.png")))
        );

        let scratches = detector(
            DetectorKind::Scratches,
            FailurePolicy::CannedLabel(UNREACHABLE_LABEL.into()),
        )
        .fallback_outcome(&err);
        assert_eq!(scratches.labels, vec![UNREACHABLE_LABEL]);
        assert_eq!(scratches.error, None);
        assert_eq!(scratches.origin, Origin::Fallback);
    }

    #[tokio::test]
    async fn missing_file_is_rejected_before_sending() {
        let d = detector(DetectorKind::Labels, FailurePolicy::ErrorMessage);
        let err = d.submit(None).await.unwrap_err();
        assert!(matches!(err, UploadError::NoFileSelected));
        assert_eq!(err.to_string(), "Please choose an image first");
        assert!(!d.is_busy());
    }

    #[test]
    fn busy_flag_blocks_second_submission() {
        let d = detector(DetectorKind::Labels, FailurePolicy::ErrorMessage);
        let guard = d.acquire().unwrap();
        assert!(d.is_busy());
        assert!(matches!(d.acquire(), Err(UploadError::Busy)));
        drop(guard);
        assert!(!d.is_busy());
        assert!(d.acquire().is_ok());
    }
}
