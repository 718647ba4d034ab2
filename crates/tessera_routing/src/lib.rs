//! Configuration, credentials, tier resolution and retry policy.
//!
//! This crate answers "where does a request go and how hard do we try":
//! - [`TesseraConfig`] loads layered TOML configuration
//! - [`Credentials`] resolves secret references at dispatch time
//! - [`TierResolver`] maps a public tier to its concrete backend binding
//! - [`RetryPolicy`] retries throttled calls with exponential backoff

mod config;
mod credentials;
mod resolver;
mod retry;

pub use config::{
    HttpConfig, LedgerConfig, PlanAllowances, PricingTable, RetryConfig, TesseraConfig,
    TierPrice, TierTable,
};
pub use credentials::Credentials;
pub use resolver::TierResolver;
pub use retry::RetryPolicy;
