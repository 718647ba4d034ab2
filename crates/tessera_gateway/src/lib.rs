//! The Tessera gateway: one chat/stream surface over five upstream backends.
//!
//! A request names a capability tier. The gateway resolves it to a backend
//! binding, runs the call under the retry policy, fails over once to the
//! configured high-availability backend on transient failure, and hands the
//! caller a uniform [`TextStream`] for streamed answers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod failover;
mod gateway;
mod metrics;
mod normalizer;
mod registry;

pub use failover::FailoverController;
pub use gateway::{ChatRequest, Gateway};
pub use metrics::GatewayMetrics;
pub use normalizer::TextStream;
pub use registry::AdapterRegistry;
