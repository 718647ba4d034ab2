//! Error types for the Tessera gateway.
//!
//! This crate provides the error taxonomy shared by every Tessera crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Upstream failures keep their classification all the way to the caller, so a UI
//! can tell "insufficient credits" apart from "service error".
//!
//! # Examples
//!
//! ```
//! use tessera_error::{TesseraResult, UpstreamError, UpstreamErrorKind};
//!
//! fn call_backend() -> TesseraResult<String> {
//!     Err(UpstreamError::new(UpstreamErrorKind::Unavailable("connection reset".into())))?
//! }
//!
//! match call_backend() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod ledger;
mod request;
mod unavailable;
mod upstream;

pub use config::ConfigError;
pub use error::{TesseraError, TesseraErrorKind, TesseraResult};
pub use ledger::{LedgerError, LedgerErrorKind};
pub use request::InvalidRequestError;
pub use unavailable::ServiceUnavailableError;
pub use upstream::{RetryableError, UpstreamError, UpstreamErrorKind, UpstreamResult};
