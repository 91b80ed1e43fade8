//! Library side of the `fundsync` binary: configuration, logging and the
//! pipelines, kept here so integration tests can drive them directly.

pub mod config;
pub mod logging;
pub mod pipeline;
