//! Ephemera Traits - Key-value engine abstractions.
//!
//! This crate provides the interfaces shared across the Ephemera workspace:
//! - [`KvEngine`], the command surface the stores need from the engine
//! - [`Batch`] / [`Command`] / [`Reply`] for atomic multi-command execution
//! - [`EngineError`], the failure taxonomy of an engine round-trip

pub mod batch;
pub mod engine;
pub mod error;

pub use batch::{Batch, Command, Reply, check_expire_secs};
pub use engine::{KvEngine, MAX_EXPIRE_SECS, PING_REPLY};
pub use error::{EngineError, Result as EngineResult};
