//! Simulated camera stream connection.
//!
//! No protocol is negotiated: connecting waits out a fixed delay and then
//! succeeds, unless the URL contains `"error"`.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONNECT_DELAY: Duration = Duration::from_millis(2000);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("no camera stream configured")]
    NotConfigured,
    #[error("failed to connect to camera stream: {0}")]
    ConnectionFailed(String),
}

#[derive(Debug, Clone, Copy)]
pub struct StreamProbe {
    delay: Duration,
}

impl StreamProbe {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Connect to `url` after the configured delay.
    pub async fn connect(&self, url: &str) -> Result<(), StreamError> {
        if url.trim().is_empty() {
            return Err(StreamError::NotConfigured);
        }
        tracing::debug!(url, delay_ms = self.delay.as_millis() as u64, "connecting to stream");
        tokio::time::sleep(self.delay).await;

        if url.contains("error") {
            tracing::warn!(url, "camera stream connection failed");
            return Err(StreamError::ConnectionFailed(url.to_string()));
        }
        tracing::info!(url, "camera stream connected");
        Ok(())
    }
}

impl Default for StreamProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_connect_waits_for_delay() {
        let start = tokio::time::Instant::now();
        StreamProbe::default().connect("rtsp://192.168.1.100:554/stream1").await.unwrap();
        assert!(start.elapsed() >= DEFAULT_CONNECT_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_error_url() {
        let err = StreamProbe::default().connect("rtsp://error.local/x").await.unwrap_err();
        assert!(matches!(err, StreamError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn test_connect_empty_url() {
        let err = StreamProbe::new(Duration::ZERO).connect("  ").await.unwrap_err();
        assert_eq!(err, StreamError::NotConfigured);
    }
}
