//! I/O Instrumentation Module
//!
//! A transparent wrapper that counts primitive file calls so the locality
//! cost of each addressing scheme can be compared.
//!
//! ## Responsibilities
//! - Delegate read/write/seek unchanged to the wrapped handle
//! - Count every call, including failed ones
//! - Snapshot and diff counters around an operation

mod counting;

pub use counting::{CountingFile, IoStats};
