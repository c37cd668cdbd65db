use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{BackendError, Result, join_url, read_json};
use crate::reading::{ChipReading, MotorReading, Reading, ReadingSchema};

/// Anything that can hand the monitor a fresh reading.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch(&self) -> Result<Reading>;
}

/// Client for the rig's live reading endpoint (`GET /l293d`).
pub struct L293dClient {
    client: reqwest::Client,
    url: String,
    schema: ReadingSchema,
}

impl L293dClient {
    pub fn new(base_url: &str, path: &str, timeout: Duration, schema: ReadingSchema) -> Result<Self> {
        let url = join_url(base_url, path);
        debug!("Initializing reading client for {} ({:?} schema)", url, schema);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(L293dClient { client, url, schema })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn schema(&self) -> ReadingSchema {
        self.schema
    }
}

#[async_trait]
impl ReadingSource for L293dClient {
    async fn fetch(&self) -> Result<Reading> {
        debug!("Requesting reading from {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let payload = read_json(response).await?;
        let reading = parse_reading(payload, self.schema)?;
        debug!("Received live reading: {:?}", reading);
        Ok(reading)
    }
}

/// Decode a reading payload, rejecting empty or error-flagged bodies.
pub fn parse_reading(payload: Value, schema: ReadingSchema) -> Result<Reading> {
    if !is_truthy(&payload) {
        return Err(BackendError::Malformed("empty payload".to_string()));
    }
    if let Some(err) = payload.get("error").filter(|e| is_truthy(e)) {
        let reason = match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        warn!("Reading endpoint reported an error: {}", reason);
        return Err(BackendError::Flagged(reason));
    }

    let malformed = |e: serde_json::Error| BackendError::Malformed(e.to_string());
    match schema {
        ReadingSchema::Full => serde_json::from_value::<ChipReading>(payload)
            .map(Reading::Chip)
            .map_err(malformed),
        ReadingSchema::Motor => serde_json::from_value::<MotorReading>(payload)
            .map(Reading::Motor)
            .map_err(malformed),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
