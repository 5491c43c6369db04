//! `cascade-fetch` fetches one logical value from an ordered list of
//! alternative HTTP sources.
//!
//! The entry point is [`CascadeClient::resolve`] (or the free [`resolve`]):
//! - endpoints are tried in priority order, each with a retry budget
//! - every attempt is bounded by a hard per-attempt deadline
//! - `429` responses skip straight to the next source
//! - a caller predicate decides whether a payload is usable
//! - every endpoint tried is logged to a bounded [`MetricsRecorder`]

mod attempt;
mod client;
mod endpoint;
mod error;
pub mod metrics;
mod options;
mod payload;
mod policy;
mod types;

#[cfg(feature = "summary")]
pub mod summary;

pub use attempt::{AttemptOutcome, FailureKind, USER_AGENT};
pub use client::{resolve, CascadeClient};
pub use endpoint::Endpoint;
pub use error::CascadeError;
pub use metrics::{metrics, reset_metrics, AttemptMetric, MetricsRecorder};
pub use options::FetchOptions;
pub use payload::Payload;
pub use policy::{next_step, Backoff, Step};
pub use types::{CascadeResult, EXHAUSTED_ERROR, NO_SOURCE};

pub type Result<T> = std::result::Result<T, CascadeError>;
