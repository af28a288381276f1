// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration for FakeFS Core

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// When a write through a handle moves `mtime`/`ctime`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteTimestampPolicy {
    /// Writes are stamped at the next flush or close boundary, like buffered
    /// stdio streams. Several writes between two boundaries collapse into
    /// one tick.
    #[default]
    Deferred,
    /// Every write stamps immediately and the following flush or close
    /// boundary stamps once more.
    Immediate,
}

/// Ownership and permission bits given to newly created nodes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    pub uid: u32,
    pub gid: u32,
    pub file_mode: u32,
    pub dir_mode: u32,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            uid: 0,
            gid: 0,
            file_mode: 0o644,
            dir_mode: 0o755,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsLimits {
    pub max_open_handles: usize,
    /// Largest content length a file may reach, in bytes
    pub max_file_size: u64,
}

impl Default for FsLimits {
    fn default() -> Self {
        Self {
            max_open_handles: 1024,
            max_file_size: 1 << 30,
        }
    }
}

/// Top-level engine configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    pub write_timestamps: WriteTimestampPolicy,
    pub defaults: NodeDefaults,
    /// Check the owner permission bits of existing files on open
    pub enforce_permissions: bool,
    pub limits: FsLimits,
}

impl FsConfig {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Load and validate a JSON config file from the host filesystem
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json_bytes(&bytes)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate().with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> FsResult<()> {
        if self.limits.max_open_handles == 0 {
            return Err(FsError::InvalidArgument);
        }
        if self.limits.max_file_size > isize::MAX as u64 {
            return Err(FsError::InvalidArgument);
        }
        if self.defaults.file_mode & !0o7777 != 0 || self.defaults.dir_mode & !0o7777 != 0 {
            return Err(FsError::InvalidArgument);
        }
        Ok(())
    }
}
