use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::{BackendError, Result, ensure_success, join_url};

/// Multipart field name the prediction endpoints expect.
pub const FILE_FIELD: &str = "file";

/// Parsed body of a prediction response. Both label keys are collected;
/// the calling widget decides which one it reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResponse {
    pub labels: Vec<String>,
    pub scratches: Vec<String>,
    pub output_url: Option<String>,
}

impl DetectionResponse {
    /// Lenient decoding: a missing or non-array label key is treated as empty.
    pub fn from_value(value: &Value) -> Self {
        DetectionResponse {
            labels: string_list(value.get("labels")),
            scratches: string_list(value.get("scratches")),
            output_url: value
                .get("output_url")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Client for the image prediction endpoints.
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
}

impl VisionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(VisionClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload one image to `path` as a single multipart `file` field.
    pub async fn predict(&self, path: &str, file_name: &str, bytes: Vec<u8>) -> Result<DetectionResponse> {
        let url = join_url(&self.base_url, path);
        info!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), url);

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let response = ensure_success(response).await?;
        let payload = decode_body(&response.text().await?)?;
        debug!("Prediction response: {}", payload);
        Ok(DetectionResponse::from_value(&payload))
    }
}

/// A successful upload with an empty or `null` body means nothing was found.
fn decode_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    match serde_json::from_str(text) {
        Ok(Value::Null) => Ok(Value::Object(Default::default())),
        Ok(value) => Ok(value),
        Err(e) => Err(BackendError::Malformed(e.to_string())),
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_labels_and_url() {
        let response = DetectionResponse::from_value(&json!({
            "labels": ["resistor", "ic"],
            "output_url": "/outputs/result.jpg"
        }));
        assert_eq!(response.labels, vec!["resistor", "ic"]);
        assert!(response.scratches.is_empty());
        assert_eq!(response.output_url.as_deref(), Some("/outputs/result.jpg"));
    }

    #[test]
    fn non_array_labels_become_empty() {
        let response = DetectionResponse::from_value(&json!({"labels": "ic", "output_url": ""}));
        assert!(response.labels.is_empty());
        assert_eq!(response.output_url, None);
    }

    #[test]
    fn empty_success_body_decodes_as_no_detections() {
        for body in ["", "  \n", "null"] {
            let value = decode_body(body).unwrap();
            assert_eq!(DetectionResponse::from_value(&value), DetectionResponse::default());
        }
        assert!(matches!(decode_body("<html>"), Err(BackendError::Malformed(_))));
    }

    #[test]
    fn mime_guess_by_extension() {
        assert_eq!(mime_for("chip.PNG"), "image/png");
        assert_eq!(mime_for("chip.jpeg"), "image/jpeg");
        assert_eq!(mime_for("chip"), "application/octet-stream");
    }
}
