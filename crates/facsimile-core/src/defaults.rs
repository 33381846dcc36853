//! Default constants for clone and heap configuration.
//!
//! Centralizes the numbers shared by `CloneOptions`, the identity
//! registry and the benchmarks.

/// Default maximum reference-chain depth a single clone may follow.
pub const DEFAULT_MAX_CLONE_DEPTH: usize = 10_000;

/// Initial capacity of a fresh identity registry.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 64;
