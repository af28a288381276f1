// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! FakeFS Core: an in-memory filesystem with POSIX-like timestamp semantics
//!
//! The engine keeps a tree of file and directory nodes in memory and hands
//! out handles for the six stdio open modes (`r`, `r+`, `w`, `w+`, `a`,
//! `a+`). Every operation stamps `atime`, `mtime` and `ctime` the way a
//! real filesystem would, using a pluggable [`Clock`] so tests can make time
//! fully deterministic.
//!
//! ```
//! use std::path::Path;
//! use std::sync::Arc;
//! use fakefs_core::{FsConfig, FsCore, ManualClock, OpenMode};
//!
//! let fs = FsCore::with_clock(FsConfig::default(), Arc::new(ManualClock::default())).unwrap();
//! let h = fs.open(Path::new("/hello.txt"), OpenMode::Write).unwrap();
//! fs.write(h, b"hello").unwrap();
//! fs.close(h).unwrap();
//!
//! let meta = fs.stat(Path::new("/hello.txt")).unwrap();
//! assert_eq!(meta.size, 5);
//! assert!(meta.modified_at() > meta.created_at());
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod file;
pub mod types;
pub mod vfs;

mod handle;
mod tree;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FsConfig, FsLimits, NodeDefaults, WriteTimestampPolicy};
pub use error::{FsError, FsResult};
pub use file::OpenFile;
pub use types::*;
pub use vfs::FsCore;
