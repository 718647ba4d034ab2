//! Core data types for the Tessera AI gateway.
//!
//! This crate provides the provider-agnostic vocabulary shared by every Tessera
//! crate: conversations, capability tiers, backend bindings, accounts and usage
//! records.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod account;
mod backend;
mod message;
mod response;
mod role;
mod secret;
mod tier;

pub use account::{Account, Plan, UsageRecord};
pub use backend::{Backend, BackendBinding, CredentialRef, PlanAccess};
pub use message::{Message, estimate_workload, split_system, validate_conversation};
pub use response::{ChatResponse, StreamChunk};
pub use role::Role;
pub use secret::Secret;
pub use tier::CapabilityTier;
