//! Engine implementations.
//!
//! - [`RedisEngine`] talks to a Redis-protocol server over one multiplexed
//!   connection.
//! - [`MemoryEngine`] keeps everything in process; used by tests and local
//!   runs without a server.

mod memory;
mod redis;

pub use memory::MemoryEngine;
pub use redis::RedisEngine;
