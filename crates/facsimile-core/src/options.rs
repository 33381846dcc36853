//! Clone and heap configuration
//!
//! Both option types deserialize with serde and fill missing keys from
//! their defaults, so hosts can keep them in whatever config format they
//! already load.

use crate::defaults::DEFAULT_MAX_CLONE_DEPTH;
use serde::{Deserialize, Serialize};

/// Options for a deep clone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneOptions {
    /// Maximum reference-chain depth before failing with `DepthExceeded`
    pub max_depth: usize,

    /// Nested host-managed references keep pointing at the original
    /// object; when false they become null
    pub pass_through_host_managed: bool,

    /// Nested callback references become null; when false they keep
    /// pointing at the original callback
    pub null_callbacks: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_CLONE_DEPTH,
            pass_through_host_managed: true,
            null_callbacks: true,
        }
    }
}

impl CloneOptions {
    /// Create options with a specific depth budget
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Default::default()
        }
    }

    /// Create options that drop nested host-managed references
    pub fn dropping_host_managed() -> Self {
        Self {
            pass_through_host_managed: false,
            ..Default::default()
        }
    }
}

/// Allocation limits for a heap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapLimits {
    /// Maximum number of heap objects (None = unlimited)
    pub max_objects: Option<usize>,
}

impl HeapLimits {
    /// Create unlimited heap limits
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Create heap limits with a maximum object count
    pub fn with_max_objects(max_objects: usize) -> Self {
        Self {
            max_objects: Some(max_objects),
        }
    }
}
