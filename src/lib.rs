//! Core library for the `rampload` CLI.
//!
//! A stage-driven load generator: virtual users iterate over a randomized
//! endpoint set with think-time pacing while a scheduler ramps their number
//! through timed stages. Samples are aggregated into rates, counters and
//! latency trends, and thresholds over those metrics decide the verdict.
//! The [`orchestrator::Orchestrator`] ties the pieces together and can be
//! driven with any [`http::RequestExecutor`].
pub mod args;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod orchestrator;
pub mod random;
pub mod report;
pub mod scheduler;
pub mod shutdown;
pub mod shutdown_handlers;
pub mod thresholds;
pub mod vu;
