//! Error types shared by the benchmark workers and the harness.

use thiserror::Error;

/// Failure of a benchmark worker or of the run setup.
///
/// There are no retries anywhere in the benchmark: a worker that loses its
/// connection is no longer measuring anything useful, so the failure is
/// carried up to the harness join point and ends the run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// WebSocket connection or I/O failure.
    #[error("transport failure: {0}")]
    Transport(#[from] tungstenite::Error),

    /// A channel or connection was torn down while a worker still needed it.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    /// A protocol frame could not be encoded or decoded.
    #[error("codec failure: {0}")]
    Codec(#[from] serde_json::Error),

    /// A worker task was cancelled or panicked before finishing.
    #[error("worker cancelled: {0}")]
    Cancelled(String),
}
