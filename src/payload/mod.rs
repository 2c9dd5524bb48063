//! Benchmark payload codec.
//!
//! Every message starts with a 12-byte header: a big-endian 4-byte sequence
//! number followed by a big-endian 8-byte send timestamp taken from a
//! process-wide monotonic clock. Anything past the header is zero padding up
//! to the configured minimum message size.

use std::sync::OnceLock;
use std::time::Instant;

/// Encoded header length: 4-byte sequence number + 8-byte timestamp.
pub const HEADER_LEN: usize = 12;

static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds on a process-wide monotonic clock.
///
/// The epoch is pinned on first use, so send and receive timestamps taken in
/// the same process are directly comparable. Wall-clock time is deliberately
/// not used here; it can jump.
pub fn now_nanos() -> u64 {
    CLOCK_EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Builds a message body of at least `min_size` bytes.
///
/// When `min_size` is smaller than the header, the bare header is emitted.
pub fn encode(sequence: u32, timestamp_nanos: u64, min_size: usize) -> Vec<u8> {
    let mut body = vec![0u8; min_size.max(HEADER_LEN)];
    body[..4].copy_from_slice(&sequence.to_be_bytes());
    body[4..HEADER_LEN].copy_from_slice(&timestamp_nanos.to_be_bytes());
    body
}

/// Reads the sequence number back out of a message body.
pub fn decode_sequence(body: &[u8]) -> Option<u32> {
    let bytes = body.get(..4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

/// Reads the send timestamp back out of a message body.
pub fn decode_timestamp(body: &[u8]) -> Option<u64> {
    let bytes = body.get(4..HEADER_LEN)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}

#[cfg(test)]
mod tests;
