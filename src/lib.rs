//! # Wanas - Modbus poller for Wanas heat recovery units
//!
//! Polls the unit's holding registers on a fixed interval, decodes them into
//! sensor values and drives its on/off functions by writing single registers.
//! Results are exposed over a small REST API.
//!
//! ## Architecture
//!
//! - `catalog`: static sensor and switch descriptors of the device
//! - `registers`: effective register map (catalog plus overrides)
//! - `planner`: groups sparse addresses into contiguous read blocks
//! - `codec`: raw word to physical value decoding
//! - `transport` / `modbus`: transport capability and its tokio-modbus client
//! - `connection`: lazy connect, invalidation after transport errors
//! - `coordinator`: serialized poll cycles, writes and state publication
//! - `entities`: per-descriptor views over the published snapshot
//! - `web`: HTTP server and REST API
//! - `config` / `logging` / `error`: ambient plumbing

pub mod catalog;
pub mod codec;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod entities;
pub mod error;
pub mod logging;
pub mod modbus;
pub mod planner;
pub mod registers;
pub mod transport;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{PollCoordinator, PollState, Snapshot};
pub use entities::{EntityRegistry, EntityView};
pub use error::{Result, WanasError};
