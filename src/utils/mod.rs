//! The `utils` module provides shared definitions used across the
//! `mcast-bench` application, currently the common error types.

pub mod error;
