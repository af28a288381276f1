// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Virtual filesystem engine for FakeFS Core

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::{FsError, FsResult};
use crate::file::OpenFile;
use crate::handle::FileHandle;
use crate::tree::{self, FsTree, Node, NodeId};
use crate::{FsConfig, HandleId, Metadata, OpenMode, Timestamp};

pub(crate) const COMPONENT: &str = "fakefs-core";

#[derive(Debug)]
struct CoreState {
    tree: FsTree,
    handles: HashMap<HandleId, FileHandle>,
    next_handle_id: u64,
}

impl CoreState {
    fn handle_mut(&mut self, id: HandleId) -> FsResult<(&mut FileHandle, &mut Node)> {
        let CoreState {
            tree,
            handles,
            next_handle_id,
        } = self;
        let handle = match handles.get_mut(&id) {
            Some(handle) => handle,
            None if id.0 > 0 && id.0 < *next_handle_id => return Err(FsError::HandleClosed),
            None => return Err(FsError::BadHandle),
        };
        let node = tree.node_mut(handle.node_id)?;
        Ok((handle, node))
    }

    fn is_open(&self, node: NodeId) -> bool {
        self.handles.values().any(|handle| handle.node_id == node)
    }
}

/// The FakeFS engine: a node tree, a handle table and a clock
///
/// All state sits behind one mutex, so every operation is atomic with
/// respect to the others and `FsCore` can be shared across threads.
pub struct FsCore {
    config: FsConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<CoreState>,
}

impl std::fmt::Debug for FsCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsCore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FsCore {
    /// Create a new FsCore instance stamping with the system clock
    pub fn new(config: FsConfig) -> FsResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a new FsCore instance with an explicit time source
    pub fn with_clock(config: FsConfig, clock: Arc<dyn Clock>) -> FsResult<Self> {
        config.validate()?;
        let tree = FsTree::new(config.defaults.clone(), clock.now());
        debug!(
            component = COMPONENT,
            write_timestamps = ?config.write_timestamps,
            enforce_permissions = config.enforce_permissions,
            "filesystem created"
        );
        Ok(Self {
            config,
            clock,
            state: Mutex::new(CoreState {
                tree,
                handles: HashMap::new(),
                next_handle_id: 1,
            }),
        })
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_access(&self, node: &Node, mode: OpenMode) -> FsResult<()> {
        if !self.config.enforce_permissions {
            return Ok(());
        }
        let owner = node.metadata().mode_user();
        if (mode.can_read() && !owner.read) || (mode.can_write() && !owner.write) {
            return Err(FsError::PermissionDenied);
        }
        Ok(())
    }

    /// Open a file, creating or truncating it as `mode` dictates
    pub fn open(&self, path: &Path, mode: OpenMode) -> FsResult<HandleId> {
        let mut state = self.lock();
        if state.handles.len() >= self.config.limits.max_open_handles {
            return Err(FsError::TooManyOpenFiles);
        }

        let existing = match state.tree.resolve(path) {
            Ok(id) => Some(id),
            Err(FsError::NotFound) if mode.creates() => None,
            Err(err) => return Err(err),
        };
        if let Some(id) = existing {
            let node = state.tree.node(id)?;
            if node.is_dir() {
                return Err(FsError::IsADirectory);
            }
        }
        if tree::names_directory(path) {
            return Err(match existing {
                Some(_) => FsError::NotADirectory,
                None => FsError::IsADirectory,
            });
        }
        if let Some(id) = existing {
            self.check_access(state.tree.node(id)?, mode)?;
        }

        let node_id = match existing {
            Some(id) if !mode.truncates() => id,
            _ => state.tree.create_file(path, mode.truncates(), &*self.clock)?,
        };

        let id = HandleId(state.next_handle_id);
        state.next_handle_id += 1;
        let handle = FileHandle::new(
            id,
            state.tree.node(node_id)?,
            path.to_path_buf(),
            mode,
            self.config.limits.max_file_size,
        );
        state.handles.insert(id, handle);

        debug!(
            component = COMPONENT,
            handle = %id,
            path = %path.display(),
            mode = %mode,
            created = existing.is_none(),
            "file opened"
        );
        Ok(id)
    }

    /// Open a file and wrap the handle in an [`OpenFile`]
    pub fn open_file(&self, path: &Path, mode: OpenMode) -> FsResult<OpenFile<'_>> {
        let id = self.open(path, mode)?;
        Ok(OpenFile::new(self, id))
    }

    /// Read up to `len` bytes from the handle's cursor, or to the end when
    /// `len` is `None`
    pub fn read(&self, id: HandleId, len: Option<usize>) -> FsResult<Vec<u8>> {
        let mut state = self.lock();
        let (handle, node) = state.handle_mut(id)?;
        let data = handle.read(node, len, &*self.clock)?;
        trace!(component = COMPONENT, handle = %id, bytes = data.len(), "read");
        Ok(data)
    }

    pub fn write(&self, id: HandleId, data: &[u8]) -> FsResult<usize> {
        let mut state = self.lock();
        let (handle, node) = state.handle_mut(id)?;
        let written = handle.write(node, data, &*self.clock, self.config.write_timestamps)?;
        trace!(
            component = COMPONENT,
            handle = %id,
            bytes = written,
            size = node.len(),
            "write"
        );
        Ok(written)
    }

    pub fn flush(&self, id: HandleId) -> FsResult<()> {
        let mut state = self.lock();
        let (handle, node) = state.handle_mut(id)?;
        let dirty = handle.is_dirty();
        handle.flush(node, &*self.clock)?;
        trace!(component = COMPONENT, handle = %id, dirty, "flush");
        Ok(())
    }

    /// Flush and release the handle. A file removed while open is dropped
    /// when its last handle closes.
    pub fn close(&self, id: HandleId) -> FsResult<()> {
        let mut state = self.lock();
        let (handle, node) = state.handle_mut(id)?;
        handle.close(node, &*self.clock)?;
        let node_id = handle.node_id;

        if let Some(handle) = state.handles.remove(&id) {
            debug!(
                component = COMPONENT,
                handle = %handle.id,
                path = %handle.path.display(),
                mode = %handle.mode,
                truncated = handle.opened_with_truncate(),
                "file closed"
            );
        }
        if !state.is_open(node_id) {
            state.tree.reclaim(node_id);
        }
        Ok(())
    }

    /// Reposition the cursor; returns the new offset
    pub fn seek(&self, id: HandleId, pos: SeekFrom) -> FsResult<u64> {
        let mut state = self.lock();
        let (handle, node) = state.handle_mut(id)?;
        let len = node.len();
        handle.seek(pos, len)
    }

    pub fn tell(&self, id: HandleId) -> FsResult<u64> {
        let mut state = self.lock();
        let (handle, _) = state.handle_mut(id)?;
        handle.tell()
    }

    /// Truncate or extend the file behind a writable handle
    pub fn set_len(&self, id: HandleId, len: u64) -> FsResult<()> {
        let mut state = self.lock();
        let (handle, node) = state.handle_mut(id)?;
        handle.set_len(node, len, &*self.clock)?;
        debug!(component = COMPONENT, handle = %id, len, "file resized");
        Ok(())
    }

    /// Metadata of the file bound to a handle, even after it was removed
    pub fn fstat(&self, id: HandleId) -> FsResult<Metadata> {
        let mut state = self.lock();
        let (_, node) = state.handle_mut(id)?;
        Ok(node.metadata())
    }

    /// Current path of the file bound to a handle, `None` once it has been
    /// removed
    pub fn handle_path(&self, id: HandleId) -> FsResult<Option<PathBuf>> {
        let mut state = self.lock();
        let node_id = state.handle_mut(id)?.0.node_id;
        Ok(state.tree.path_of(node_id))
    }

    /// Metadata for a path. Never counts as an access.
    pub fn stat(&self, path: &Path) -> FsResult<Metadata> {
        let state = self.lock();
        let id = state.tree.resolve(path)?;
        Ok(state.tree.node(id)?.metadata())
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.lock().tree.resolve(path).is_ok()
    }

    pub fn mkdir(&self, path: &Path) -> FsResult<()> {
        self.lock().tree.create_directory(path, &*self.clock)?;
        debug!(component = COMPONENT, path = %path.display(), "directory created");
        Ok(())
    }

    pub fn mkdir_all(&self, path: &Path) -> FsResult<()> {
        self.lock().tree.create_dir_all(path, &*self.clock)?;
        debug!(component = COMPONENT, path = %path.display(), "directory tree created");
        Ok(())
    }

    /// Remove a file or a directory with everything below it
    pub fn remove(&self, path: &Path) -> FsResult<()> {
        let mut state = self.lock();
        let CoreState { tree, handles, .. } = &mut *state;
        let keep_open = |id: NodeId| handles.values().any(|handle| handle.node_id == id);
        let id = tree.remove(path, &*self.clock, &keep_open)?;
        debug!(
            component = COMPONENT,
            path = %path.display(),
            still_open = keep_open(id),
            "node removed"
        );
        Ok(())
    }

    pub fn rename(&self, from: &Path, to: &Path) -> FsResult<()> {
        let mut state = self.lock();
        let CoreState { tree, handles, .. } = &mut *state;
        let keep_open = |id: NodeId| handles.values().any(|handle| handle.node_id == id);
        tree.rename(from, to, &*self.clock, &keep_open)?;
        debug!(
            component = COMPONENT,
            from = %from.display(),
            to = %to.display(),
            "node renamed"
        );
        Ok(())
    }

    fn change_metadata(&self, path: &Path, apply: impl FnOnce(&mut Node, Timestamp)) -> FsResult<()> {
        let mut state = self.lock();
        let id = state.tree.resolve(path)?;
        let node = state.tree.node_mut(id)?;
        let now = self.clock.now();
        apply(node, now);
        node.times.touch_changed(now);
        Ok(())
    }

    /// Replace the permission bits. Only ctime moves.
    pub fn set_mode(&self, path: &Path, permissions: u32) -> FsResult<()> {
        if permissions & !0o7777 != 0 {
            return Err(FsError::InvalidArgument);
        }
        self.change_metadata(path, |node, _| node.mode = permissions)?;
        debug!(
            component = COMPONENT,
            path = %path.display(),
            mode = %format!("{permissions:o}"),
            "mode changed"
        );
        Ok(())
    }

    pub fn set_owner(&self, path: &Path, uid: u32, gid: u32) -> FsResult<()> {
        self.change_metadata(path, |node, _| {
            node.uid = uid;
            node.gid = gid;
        })?;
        debug!(component = COMPONENT, path = %path.display(), uid, gid, "owner changed");
        Ok(())
    }

    /// Set atime and mtime explicitly; ctime is stamped with the current time
    pub fn set_times(&self, path: &Path, atime: Timestamp, mtime: Timestamp) -> FsResult<()> {
        self.change_metadata(path, |node, _| {
            node.times.atime = atime;
            node.times.mtime = mtime;
        })?;
        debug!(component = COMPONENT, path = %path.display(), atime, mtime, "times changed");
        Ok(())
    }

    /// Create a file with the given contents, creating missing parent
    /// directories. The file carries a single creation stamp.
    pub fn create_file(&self, path: &Path, contents: &[u8]) -> FsResult<()> {
        let mut state = self.lock();
        if state.tree.resolve(path).is_ok() {
            return Err(FsError::AlreadyExists);
        }
        if tree::names_directory(path) {
            return Err(FsError::IsADirectory);
        }
        if contents.len() as u64 > self.config.limits.max_file_size {
            return Err(FsError::FileTooLarge);
        }

        let mut parent = PathBuf::from("/");
        let mut parts = tree::components(path)?;
        parts.pop();
        parent.extend(parts);
        state.tree.create_dir_all(&parent, &*self.clock)?;

        let id = state.tree.create_file(path, false, &*self.clock)?;
        state.tree.node_mut(id)?.content_mut()?.extend_from_slice(contents);
        debug!(
            component = COMPONENT,
            path = %path.display(),
            size = contents.len(),
            "file created"
        );
        Ok(())
    }

    /// Number of handles that are currently open
    pub fn open_handles(&self) -> usize {
        self.lock().handles.len()
    }

    /// Drop every node and handle and start over with an empty root.
    /// Handle ids keep counting up, so ids from before the reset report
    /// `HandleClosed`.
    pub fn reset(&self) {
        let mut state = self.lock();
        let dropped = state.handles.len();
        state.handles.clear();
        state.tree = FsTree::new(self.config.defaults.clone(), self.clock.now());
        debug!(component = COMPONENT, dropped_handles = dropped, "filesystem reset");
    }

    #[cfg(test)]
    fn node_count(&self) -> usize {
        self.lock().tree.node_count()
    }
}
