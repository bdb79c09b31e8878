//! Client-side buffering for apipulse-instrumented applications.
//!
//! Captured events accumulate in memory; once the flush interval has
//! elapsed, the next capture hands the whole buffer to a background worker
//! as one batch submission. The worker posts it and swallows every failure:
//! telemetry must never fail or block the host application's own request
//! path. There is no retry queue; lost batches are lost.

use apipulse_core::{Framework, IngestPayload, PrivacyLevel, RequestData};
use chrono::Utc;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;

/// Default ingestion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ingest.apipulse.dev/api/log-request";

/// Payloads queued for the worker but not yet posted. A full queue drops the
/// new batch; capture never waits.
const WORKER_QUEUE_DEPTH: usize = 8;

/// Configuration for a [`RequestLogger`].
pub struct LoggerConfig {
    /// API key identifying the instrumented service. An empty key disables
    /// capture entirely; telemetry is opt-in by key presence.
    pub api_key: String,
    /// Ingestion endpoint URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,
    /// The integration this logger reports as.
    pub framework: Framework,
    /// Privacy tier applied server-side to every event in the batch.
    pub privacy_level: PrivacyLevel,
    /// Time between flushes. Default: 60 s.
    pub flush_interval: Duration,
}

impl LoggerConfig {
    pub fn new(api_key: impl Into<String>, framework: Framework) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            framework,
            privacy_level: PrivacyLevel::P1,
            flush_interval: Duration::from_secs(60),
        }
    }
}

struct BufferState {
    events: Vec<RequestData>,
    last_flush: Instant,
}

/// Buffered telemetry logger.
///
/// Owns its buffer and last-flush timestamp; nothing is module-global, so an
/// application can run several loggers (or none) and tests can construct
/// them freely.
pub struct RequestLogger {
    config: LoggerConfig,
    state: Mutex<BufferState>,
    tx: mpsc::Sender<IngestPayload>,
}

impl RequestLogger {
    /// Create a logger and spawn its background flush worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: LoggerConfig) -> Self {
        let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
        tokio::spawn(flush_worker(rx, config.endpoint.clone()));
        Self::with_sender(config, tx)
    }

    fn with_sender(config: LoggerConfig, tx: mpsc::Sender<IngestPayload>) -> Self {
        Self {
            config,
            state: Mutex::new(BufferState {
                events: Vec::new(),
                last_flush: Instant::now(),
            }),
            tx,
        }
    }

    /// Buffer one captured event.
    ///
    /// When the flush interval has elapsed since the last flush, the entire
    /// buffer is handed to the worker as one batch and the timestamp resets.
    /// At most one flush per capture call, with no catch-up flushing. The
    /// network never runs on the caller's path.
    pub fn capture(&self, mut event: RequestData) {
        if self.config.api_key.is_empty() {
            return;
        }

        if event.created_at.is_empty() {
            event.created_at = Utc::now().to_rfc3339();
        }

        let payload = {
            let mut state = self.state.lock().unwrap();
            state.events.push(event);

            if state.last_flush.elapsed() < self.config.flush_interval {
                None
            } else {
                let events = std::mem::take(&mut state.events);
                state.last_flush = Instant::now();
                Some(IngestPayload {
                    api_key: self.config.api_key.clone(),
                    requests: events,
                    framework: self.config.framework.name().to_string(),
                    privacy_level: self.config.privacy_level,
                })
            }
        };

        if let Some(payload) = payload {
            if self.tx.try_send(payload).is_err() {
                debug!("Flush queue full, dropping telemetry batch");
            }
        }
    }

    /// Number of events currently buffered.
    pub fn buffered(&self) -> usize {
        self.state.lock().unwrap().events.len()
    }
}

async fn flush_worker(mut rx: mpsc::Receiver<IngestPayload>, endpoint: String) {
    let client = reqwest::Client::new();
    while let Some(payload) = rx.recv().await {
        let count = payload.requests.len();
        match client.post(&endpoint).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(count, "Flushed telemetry batch");
            }
            Ok(resp) => {
                debug!(status = %resp.status(), count, "Telemetry batch rejected");
            }
            Err(e) => {
                debug!(error = %e, count, "Telemetry flush failed");
            }
        }
    }
}
