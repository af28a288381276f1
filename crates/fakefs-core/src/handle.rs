// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-open file handle and the timestamp rules it applies.
//!
//! A handle never owns the node it is bound to; every operation receives the
//! node from the tree. Content changes land on the node right away, while the
//! `mtime`/`ctime` stamp for writes is taken according to the configured
//! [`WriteTimestampPolicy`].

use std::io::SeekFrom;
use std::path::PathBuf;

use crate::clock::Clock;
use crate::config::WriteTimestampPolicy;
use crate::error::{FsError, FsResult};
use crate::tree::{Node, NodeId};
use crate::{HandleId, OpenMode};

#[derive(Debug)]
pub(crate) struct FileHandle {
    pub id: HandleId,
    pub node_id: NodeId,
    /// Path the handle was opened with, kept for diagnostics
    pub path: PathBuf,
    pub mode: OpenMode,
    max_len: u64,
    cursor: u64,
    dirty: bool,
    opened_with_truncate: bool,
    closed: bool,
}

impl FileHandle {
    /// Bind a handle to `node`. Append modes start at the end of content.
    /// Writes and resizes may not grow the file past `max_len` bytes.
    pub fn new(id: HandleId, node: &Node, path: PathBuf, mode: OpenMode, max_len: u64) -> Self {
        let cursor = if mode.appends() { node.len() } else { 0 };
        Self {
            id,
            node_id: node.id,
            path,
            mode,
            max_len,
            cursor,
            dirty: false,
            opened_with_truncate: mode.truncates(),
            closed: false,
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn opened_with_truncate(&self) -> bool {
        self.opened_with_truncate
    }

    fn ensure_open(&self) -> FsResult<()> {
        if self.closed {
            return Err(FsError::HandleClosed);
        }
        Ok(())
    }

    /// Read up to `len` bytes (everything up to the end when `None`) from the
    /// cursor. Every read counts as an access, even one that returns nothing.
    pub fn read(&mut self, node: &mut Node, len: Option<usize>, clock: &dyn Clock) -> FsResult<Vec<u8>> {
        self.ensure_open()?;
        if !self.mode.can_read() {
            return Err(FsError::PermissionDenied);
        }

        let content = node.content()?;
        let start = usize::try_from(self.cursor).unwrap_or(usize::MAX).min(content.len());
        let available = content.len() - start;
        let count = len.map_or(available, |len| len.min(available));
        let data = content[start..start + count].to_vec();

        self.cursor += count as u64;
        node.times.touch_accessed(clock.now());
        Ok(data)
    }

    /// Write `data` at the cursor, or at the end of content in append modes.
    ///
    /// Bytes are visible on the node immediately. Writing past the end fills
    /// the gap with zeros.
    pub fn write(
        &mut self,
        node: &mut Node,
        data: &[u8],
        clock: &dyn Clock,
        policy: WriteTimestampPolicy,
    ) -> FsResult<usize> {
        self.ensure_open()?;
        if !self.mode.can_write() {
            return Err(FsError::PermissionDenied);
        }
        if data.is_empty() {
            return Ok(0);
        }

        let len = node.content()?.len() as u64;
        if self.mode.appends() {
            self.cursor = len;
        }
        let end = self
            .cursor
            .checked_add(data.len() as u64)
            .ok_or(FsError::FileTooLarge)?;
        if end > len {
            node.resize(end, self.max_len)?;
        }
        let start = usize::try_from(self.cursor).map_err(|_| FsError::FileTooLarge)?;
        node.content_mut()?[start..start + data.len()].copy_from_slice(data);

        self.cursor = end;
        self.dirty = true;
        if policy == WriteTimestampPolicy::Immediate {
            node.times.touch_modified(clock.now());
        }
        Ok(data.len())
    }

    /// Stamp pending writes. A clean handle leaves the node alone.
    pub fn flush(&mut self, node: &mut Node, clock: &dyn Clock) -> FsResult<()> {
        self.ensure_open()?;
        if self.dirty {
            node.times.touch_modified(clock.now());
            self.dirty = false;
        }
        Ok(())
    }

    /// Flush, then make the handle terminal
    pub fn close(&mut self, node: &mut Node, clock: &dyn Clock) -> FsResult<()> {
        self.flush(node, clock)?;
        self.closed = true;
        Ok(())
    }

    /// Move the cursor. `len` is the current content length, used for
    /// `SeekFrom::End`.
    pub fn seek(&mut self, pos: SeekFrom, len: u64) -> FsResult<u64> {
        self.ensure_open()?;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.cursor.checked_add_signed(delta),
            SeekFrom::End(delta) => len.checked_add_signed(delta),
        };
        self.cursor = target.ok_or(FsError::InvalidArgument)?;
        Ok(self.cursor)
    }

    pub fn tell(&self) -> FsResult<u64> {
        self.ensure_open()?;
        Ok(self.cursor())
    }

    /// Truncate or extend the bound file. The change is stamped at once.
    pub fn set_len(&mut self, node: &mut Node, len: u64, clock: &dyn Clock) -> FsResult<()> {
        self.ensure_open()?;
        if !self.mode.can_write() {
            return Err(FsError::PermissionDenied);
        }
        node.resize(len, self.max_len)?;
        node.times.touch_modified(clock.now());
        Ok(())
    }
}
