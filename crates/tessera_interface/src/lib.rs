//! Trait definitions for the Tessera AI gateway.
//!
//! The gateway layers above depend only on these traits, never on a concrete
//! backend or storage engine, so tests can swap in mocks.

mod traits;

pub use traits::{ChunkStream, LedgerStore, ProviderAdapter};
