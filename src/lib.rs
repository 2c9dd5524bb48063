//! # mcast-bench
//!
//! `mcast-bench` is a multicast throughput and latency benchmark for a
//! WebSocket publish/subscribe broker. It drives a configurable number of
//! concurrent producers and consumers against one shared exchange, isolates
//! the run's traffic behind a random run id used as routing and binding key,
//! and prints windowed and end-to-end rate/latency statistics.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct
//! responsibility:
//!
//! - `cli`: command-line flags and their resolution into a run configuration.
//! - `payload`: the 12-byte sequence/timestamp header carried by every message.
//! - `stats`: the shared windowed latency/throughput aggregator.
//! - `producer`: the send-side worker and its rate pacer.
//! - `consumer`: the receive-side worker.
//! - `harness`: connection planning and the worker spawn/join lifecycle.
//! - `transport`: the messaging capability, with a WebSocket client and an
//!   in-process loopback fabric for tests.
//! - `utils`: shared error types.

pub mod cli;
pub mod consumer;
pub mod harness;
pub mod payload;
pub mod producer;
pub mod stats;
pub mod transport;
pub mod utils;
