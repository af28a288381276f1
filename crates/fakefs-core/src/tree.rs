// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory node tree: path resolution, creation, removal and rename.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Directories own their children
//! through the id map; the `parent` field is a plain id used to rebuild paths
//! and never keeps anything alive. A file that is removed while a handle still
//! points at it is detached (its `parent` becomes `None`) and stays in the
//! arena until [`FsTree::reclaim`] is called for it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use crate::clock::Clock;
use crate::config::NodeDefaults;
use crate::error::{FsError, FsResult};
use crate::{FileTimes, Metadata, NodeType, Timestamp};

/// Internal node ID for filesystem nodes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(u64);

/// Filesystem node types
#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    File { content: Vec<u8> },
    Directory { children: BTreeMap<String, NodeId> },
}

/// Filesystem node
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub times: FileTimes,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::File { .. } => NodeType::File,
            NodeKind::Directory { .. } => NodeType::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn len(&self) -> u64 {
        match &self.kind {
            NodeKind::File { content } => content.len() as u64,
            NodeKind::Directory { .. } => 0,
        }
    }

    pub fn content(&self) -> FsResult<&Vec<u8>> {
        match &self.kind {
            NodeKind::File { content } => Ok(content),
            NodeKind::Directory { .. } => Err(FsError::IsADirectory),
        }
    }

    pub fn content_mut(&mut self) -> FsResult<&mut Vec<u8>> {
        match &mut self.kind {
            NodeKind::File { content } => Ok(content),
            NodeKind::Directory { .. } => Err(FsError::IsADirectory),
        }
    }

    /// Resize file content to `len`, zero-filling any growth. Lengths above
    /// `max_len`, or that cannot be allocated, fail with `FileTooLarge`.
    pub fn resize(&mut self, len: u64, max_len: u64) -> FsResult<()> {
        if len > max_len {
            return Err(FsError::FileTooLarge);
        }
        let len = usize::try_from(len).map_err(|_| FsError::FileTooLarge)?;
        let content = self.content_mut()?;
        if let Some(extra) = len.checked_sub(content.len()) {
            content.try_reserve(extra).map_err(|_| FsError::FileTooLarge)?;
        }
        content.resize(len, 0);
        Ok(())
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            kind: self.node_type(),
            size: self.len(),
            permissions: self.mode & 0o7777,
            uid: self.uid,
            gid: self.gid,
            times: self.times,
        }
    }
}

/// Splits a path into normalized name components.
///
/// `.` is dropped, `..` removes the previous component (never climbing above
/// the root) and relative paths are taken from the root.
pub(crate) fn components(path: &Path) -> FsResult<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or(FsError::InvalidName)?;
                out.push(name.to_string());
            }
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    Ok(out)
}

/// Whether `path` ends in a separator, which only a directory may satisfy
pub(crate) fn names_directory(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|s| s.len() > 1 && s.ends_with(std::path::is_separator))
}

/// The node arena plus its root directory
#[derive(Debug)]
pub(crate) struct FsTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_node_id: u64,
    defaults: NodeDefaults,
}

impl FsTree {
    pub fn new(defaults: NodeDefaults, now: Timestamp) -> Self {
        let root = NodeId(1);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                id: root,
                name: String::new(),
                parent: None,
                kind: NodeKind::Directory {
                    children: BTreeMap::new(),
                },
                times: FileTimes::at(now),
                mode: defaults.dir_mode,
                uid: defaults.uid,
                gid: defaults.gid,
            },
        );

        Self {
            nodes,
            root,
            next_node_id: 2,
            defaults,
        }
    }

    #[cfg(test)]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[cfg(test)]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> FsResult<&Node> {
        self.nodes.get(&id).ok_or(FsError::NotFound)
    }

    pub fn node_mut(&mut self, id: NodeId) -> FsResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(FsError::NotFound)
    }

    fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn children(&self, dir: NodeId) -> FsResult<&BTreeMap<String, NodeId>> {
        match &self.node(dir)?.kind {
            NodeKind::Directory { children } => Ok(children),
            NodeKind::File { .. } => Err(FsError::NotADirectory),
        }
    }

    fn lookup(&self, dir: NodeId, name: &str) -> FsResult<Option<NodeId>> {
        Ok(self.children(dir)?.get(name).copied())
    }

    /// Resolve a path to a node
    pub fn resolve(&self, path: &Path) -> FsResult<NodeId> {
        let components = components(path)?;
        let mut current = self.root;
        for (i, name) in components.iter().enumerate() {
            let children = match &self.node(current)?.kind {
                NodeKind::Directory { children } => children,
                NodeKind::File { .. } => return Err(FsError::NotADirectory),
            };
            current = *children.get(name).ok_or(FsError::NotFound)?;
            if i + 1 < components.len() && !self.node(current)?.is_dir() {
                return Err(FsError::NotADirectory);
            }
        }
        Ok(current)
    }

    /// Resolve the directory that holds the last component of `path`
    pub fn resolve_parent(&self, path: &Path) -> FsResult<(NodeId, String)> {
        let mut components = components(path)?;
        let name = components.pop().ok_or(FsError::InvalidArgument)?;

        let mut parent = self.root;
        for component in &components {
            parent = self.lookup(parent, component)?.ok_or(FsError::NotFound)?;
        }
        if !self.node(parent)?.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok((parent, name))
    }

    /// Absolute path of an attached node, `None` once it has been detached
    pub fn path_of(&self, id: NodeId) -> Option<PathBuf> {
        let mut names = Vec::new();
        let mut current = self.nodes.get(&id)?;
        while current.id != self.root {
            names.push(current.name.as_str());
            current = self.nodes.get(&current.parent?)?;
        }
        let mut path = PathBuf::from("/");
        path.extend(names.iter().rev());
        Some(path)
    }

    fn link(&mut self, parent: NodeId, name: &str, child: NodeId, now: Timestamp) -> FsResult<()> {
        let parent_node = self.node_mut(parent)?;
        match &mut parent_node.kind {
            NodeKind::Directory { children } => {
                if children.contains_key(name) {
                    return Err(FsError::AlreadyExists);
                }
                children.insert(name.to_string(), child);
                parent_node.times.touch_modified(now);
            }
            NodeKind::File { .. } => return Err(FsError::NotADirectory),
        }

        let child_node = self.node_mut(child)?;
        child_node.parent = Some(parent);
        child_node.name = name.to_string();
        Ok(())
    }

    fn unlink(&mut self, parent: NodeId, name: &str, now: Timestamp) -> Option<NodeId> {
        let parent_node = self.nodes.get_mut(&parent)?;
        let NodeKind::Directory { children } = &mut parent_node.kind else {
            return None;
        };
        let child = children.remove(name)?;
        parent_node.times.touch_modified(now);
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = None;
        }
        Some(child)
    }

    fn insert_node(&mut self, kind: NodeKind, mode: u32, now: Timestamp) -> NodeId {
        let id = self.allocate_node_id();
        self.nodes.insert(
            id,
            Node {
                id,
                name: String::new(),
                parent: None,
                kind,
                times: FileTimes::at(now),
                mode,
                uid: self.defaults.uid,
                gid: self.defaults.gid,
            },
        );
        id
    }

    /// Create a file, or return the existing one.
    ///
    /// With `overwrite` an existing file is truncated to zero length and its
    /// mtime/ctime are stamped; without it the existing node is returned
    /// untouched. A new file gets one creation stamp shared by all of its
    /// timestamps and by the parent's mtime/ctime.
    pub fn create_file(&mut self, path: &Path, overwrite: bool, clock: &dyn Clock) -> FsResult<NodeId> {
        let (parent, name) = self.resolve_parent(path)?;
        if let Some(existing) = self.lookup(parent, &name)? {
            if self.node(existing)?.is_dir() {
                return Err(FsError::IsADirectory);
            }
            if overwrite {
                self.truncate(existing, clock.now())?;
            }
            return Ok(existing);
        }

        let now = clock.now();
        let mode = self.defaults.file_mode;
        let id = self.insert_node(NodeKind::File { content: Vec::new() }, mode, now);
        self.link(parent, &name, id, now)?;
        Ok(id)
    }

    /// Empty file content and stamp mtime/ctime
    pub fn truncate(&mut self, id: NodeId, now: Timestamp) -> FsResult<()> {
        let node = self.node_mut(id)?;
        node.content_mut()?.clear();
        node.times.touch_modified(now);
        Ok(())
    }

    pub fn create_directory(&mut self, path: &Path, clock: &dyn Clock) -> FsResult<NodeId> {
        if components(path)?.is_empty() {
            return Err(FsError::AlreadyExists);
        }
        let (parent, name) = self.resolve_parent(path)?;
        if self.lookup(parent, &name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }

        let now = clock.now();
        let mode = self.defaults.dir_mode;
        let id = self.insert_node(
            NodeKind::Directory {
                children: BTreeMap::new(),
            },
            mode,
            now,
        );
        self.link(parent, &name, id, now)?;
        Ok(id)
    }

    /// Create a directory and any missing ancestors. Existing directories
    /// along the way (including the target) are left untouched.
    pub fn create_dir_all(&mut self, path: &Path, clock: &dyn Clock) -> FsResult<NodeId> {
        let components = components(path)?;
        let mut current = self.root;
        let mut built = PathBuf::from("/");
        for (i, name) in components.iter().enumerate() {
            built.push(name);
            current = match self.lookup(current, name)? {
                Some(id) if self.node(id)?.is_dir() => id,
                Some(_) if i + 1 == components.len() => return Err(FsError::AlreadyExists),
                Some(_) => return Err(FsError::NotADirectory),
                None => self.create_directory(&built, clock)?,
            };
        }
        Ok(current)
    }

    /// Drop a detached subtree from the arena. Files for which `keep_open`
    /// answers true stay behind as orphans.
    fn drop_subtree(&mut self, top: NodeId, keep_open: &dyn Fn(NodeId) -> bool) {
        let mut stack = vec![top];
        while let Some(id) = stack.pop() {
            if keep_open(id) {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.parent = None;
                }
                continue;
            }
            if let Some(node) = self.nodes.remove(&id) {
                if let NodeKind::Directory { children } = node.kind {
                    stack.extend(children.into_values());
                }
            }
        }
    }

    /// Remove a file or a whole directory subtree
    pub fn remove(
        &mut self,
        path: &Path,
        clock: &dyn Clock,
        keep_open: &dyn Fn(NodeId) -> bool,
    ) -> FsResult<NodeId> {
        let id = self.resolve(path)?;
        if id == self.root {
            return Err(FsError::InvalidArgument);
        }
        let (parent, name) = self.resolve_parent(path)?;
        self.unlink(parent, &name, clock.now());
        self.drop_subtree(id, keep_open);
        Ok(id)
    }

    fn is_same_or_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes.get(&id).and_then(|n| n.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Move a node to a new path, replacing a compatible destination
    pub fn rename(
        &mut self,
        from: &Path,
        to: &Path,
        clock: &dyn Clock,
        keep_open: &dyn Fn(NodeId) -> bool,
    ) -> FsResult<()> {
        let src = self.resolve(from)?;
        if src == self.root {
            return Err(FsError::InvalidArgument);
        }
        let (src_parent, src_name) = self.resolve_parent(from)?;
        let (dst_parent, dst_name) = self.resolve_parent(to)?;
        let src_is_dir = self.node(src)?.is_dir();

        if src_is_dir && self.is_same_or_ancestor(src, dst_parent) {
            return Err(FsError::InvalidArgument);
        }

        let replaced = match self.lookup(dst_parent, &dst_name)? {
            Some(dst) if dst == src => return Ok(()),
            Some(dst) => {
                let dst_node = self.node(dst)?;
                match (&dst_node.kind, src_is_dir) {
                    (NodeKind::Directory { children }, true) if !children.is_empty() => {
                        return Err(FsError::DirectoryNotEmpty);
                    }
                    (NodeKind::Directory { .. }, false) => return Err(FsError::IsADirectory),
                    (NodeKind::File { .. }, true) => return Err(FsError::NotADirectory),
                    _ => {}
                }
                Some(dst)
            }
            None => None,
        };

        let now = clock.now();
        if let Some(dst) = replaced {
            self.unlink(dst_parent, &dst_name, now);
            self.drop_subtree(dst, keep_open);
        }
        self.unlink(src_parent, &src_name, now);
        self.link(dst_parent, &dst_name, src, now)?;
        self.node_mut(src)?.times.touch_changed(now);
        Ok(())
    }

    /// Release a detached node once nothing refers to it any more
    pub fn reclaim(&mut self, id: NodeId) {
        let detached = id != self.root
            && self.nodes.get(&id).is_some_and(|node| node.parent.is_none());
        if detached {
            self.nodes.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn never_open(_: NodeId) -> bool {
        false
    }

    fn setup() -> (FsTree, ManualClock) {
        let clock = ManualClock::new(0);
        let tree = FsTree::new(NodeDefaults::default(), clock.now());
        (tree, clock)
    }

    #[test]
    fn test_components_normalization() {
        let parts = components(Path::new("/a/./b/../c//d/")).unwrap();
        assert_eq!(parts, vec!["a", "c", "d"]);
        assert!(components(Path::new("/..")).unwrap().is_empty());
        assert_eq!(components(Path::new("x/y")).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_resolve_root() {
        let (tree, _) = setup();
        assert_eq!(tree.resolve(Path::new("/")).unwrap(), tree.root());
        assert_eq!(tree.resolve(Path::new("")).unwrap(), tree.root());
    }

    #[test]
    fn test_resolve_errors() {
        let (mut tree, clock) = setup();
        tree.create_directory(Path::new("/dir"), &clock).unwrap();
        tree.create_file(Path::new("/dir/file"), false, &clock).unwrap();

        assert_eq!(tree.resolve(Path::new("/missing")), Err(FsError::NotFound));
        assert_eq!(tree.resolve(Path::new("/missing/child")), Err(FsError::NotFound));
        assert_eq!(tree.resolve(Path::new("/dir/file/child")), Err(FsError::NotADirectory));
        assert_eq!(
            tree.create_file(Path::new("/dir/file/child"), false, &clock),
            Err(FsError::NotADirectory)
        );
    }

    #[test]
    fn test_create_file_stamps_once() {
        let (mut tree, clock) = setup();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        let times = tree.node(id).unwrap().times;
        assert_eq!(times, FileTimes::at(times.birthtime));

        // Parent shares the creation instant
        let root_times = tree.node(tree.root()).unwrap().times;
        assert_eq!(root_times.mtime, times.birthtime);
        assert_eq!(root_times.ctime, times.birthtime);
    }

    #[test]
    fn test_create_file_without_overwrite_is_untouched() {
        let (mut tree, clock) = setup();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        tree.node_mut(id).unwrap().content_mut().unwrap().extend_from_slice(b"data");
        let before = tree.node(id).unwrap().times;

        let again = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        assert_eq!(again, id);
        let node = tree.node(id).unwrap();
        assert_eq!(node.times, before);
        assert_eq!(node.content().unwrap(), b"data");
    }

    #[test]
    fn test_create_file_with_overwrite_truncates() {
        let (mut tree, clock) = setup();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        tree.node_mut(id).unwrap().content_mut().unwrap().extend_from_slice(b"data");
        let before = tree.node(id).unwrap().times;

        tree.create_file(Path::new("/f"), true, &clock).unwrap();
        let node = tree.node(id).unwrap();
        assert!(node.content().unwrap().is_empty());
        assert!(node.times.mtime > before.mtime);
        assert!(node.times.ctime > before.ctime);
        assert_eq!(node.times.atime, before.atime);
        assert_eq!(node.times.birthtime, before.birthtime);
    }

    #[test]
    fn test_create_file_over_directory() {
        let (mut tree, clock) = setup();
        tree.create_directory(Path::new("/d"), &clock).unwrap();
        assert_eq!(
            tree.create_file(Path::new("/d"), true, &clock),
            Err(FsError::IsADirectory)
        );
    }

    #[test]
    fn test_create_directory_collisions() {
        let (mut tree, clock) = setup();
        tree.create_directory(Path::new("/d"), &clock).unwrap();
        tree.create_file(Path::new("/f"), false, &clock).unwrap();

        assert_eq!(tree.create_directory(Path::new("/d"), &clock), Err(FsError::AlreadyExists));
        assert_eq!(tree.create_directory(Path::new("/f"), &clock), Err(FsError::AlreadyExists));
        assert_eq!(tree.create_directory(Path::new("/x/y"), &clock), Err(FsError::NotFound));
        assert_eq!(tree.create_directory(Path::new("/"), &clock), Err(FsError::AlreadyExists));
        assert_eq!(tree.create_directory(Path::new("/d/.."), &clock), Err(FsError::AlreadyExists));
    }

    #[test]
    fn test_resize_bounds() {
        let (mut tree, clock) = setup();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        let node = tree.node_mut(id).unwrap();

        node.resize(4, 8).unwrap();
        assert_eq!(node.content().unwrap(), &[0u8; 4]);
        node.resize(2, 8).unwrap();
        assert_eq!(node.len(), 2);

        assert_eq!(node.resize(9, 8), Err(FsError::FileTooLarge));
        assert_eq!(node.resize(u64::MAX, u64::MAX), Err(FsError::FileTooLarge));
        assert_eq!(node.len(), 2);
    }

    #[test]
    fn test_names_directory() {
        assert!(names_directory(Path::new("/f/")));
        assert!(names_directory(Path::new("/a/b//")));
        assert!(!names_directory(Path::new("/f")));
        assert!(!names_directory(Path::new("/")));
    }

    #[test]
    fn test_create_dir_all() {
        let (mut tree, clock) = setup();
        let id = tree.create_dir_all(Path::new("/a/b/c"), &clock).unwrap();
        assert_eq!(tree.resolve(Path::new("/a/b/c")).unwrap(), id);
        assert_eq!(tree.create_dir_all(Path::new("/a/b/c"), &clock).unwrap(), id);

        tree.create_file(Path::new("/a/file"), false, &clock).unwrap();
        assert_eq!(
            tree.create_dir_all(Path::new("/a/file"), &clock),
            Err(FsError::AlreadyExists)
        );
        assert_eq!(
            tree.create_dir_all(Path::new("/a/file/sub"), &clock),
            Err(FsError::NotADirectory)
        );
    }

    #[test]
    fn test_remove_subtree() {
        let (mut tree, clock) = setup();
        tree.create_dir_all(Path::new("/a/b"), &clock).unwrap();
        tree.create_file(Path::new("/a/b/f"), false, &clock).unwrap();
        tree.create_file(Path::new("/a/g"), false, &clock).unwrap();
        assert_eq!(tree.node_count(), 5);

        tree.remove(Path::new("/a"), &clock, &never_open).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.resolve(Path::new("/a")), Err(FsError::NotFound));
    }

    #[test]
    fn test_remove_root_fails() {
        let (mut tree, clock) = setup();
        assert_eq!(
            tree.remove(Path::new("/"), &clock, &never_open),
            Err(FsError::InvalidArgument)
        );
    }

    #[test]
    fn test_remove_keeps_open_files_detached() {
        let (mut tree, clock) = setup();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();

        tree.remove(Path::new("/f"), &clock, &|n| n == id).unwrap();
        assert_eq!(tree.resolve(Path::new("/f")), Err(FsError::NotFound));
        assert!(tree.node(id).is_ok());
        assert_eq!(tree.path_of(id), None);

        tree.reclaim(id);
        assert!(tree.node(id).is_err());
    }

    #[test]
    fn test_reclaim_ignores_attached_nodes() {
        let (mut tree, clock) = setup();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        tree.reclaim(id);
        tree.reclaim(tree.root());
        assert!(tree.node(id).is_ok());
        assert!(tree.node(tree.root()).is_ok());
    }

    #[test]
    fn test_path_of() {
        let (mut tree, clock) = setup();
        tree.create_dir_all(Path::new("/a/b"), &clock).unwrap();
        let id = tree.create_file(Path::new("/a/b/f.txt"), false, &clock).unwrap();
        assert_eq!(tree.path_of(id), Some(PathBuf::from("/a/b/f.txt")));
        assert_eq!(tree.path_of(tree.root()), Some(PathBuf::from("/")));
    }

    #[test]
    fn test_rename_file_touches_ctime_only() {
        let (mut tree, clock) = setup();
        tree.create_directory(Path::new("/d"), &clock).unwrap();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        let before = tree.node(id).unwrap().times;

        tree.rename(Path::new("/f"), Path::new("/d/g"), &clock, &never_open).unwrap();
        assert_eq!(tree.resolve(Path::new("/d/g")).unwrap(), id);
        assert_eq!(tree.resolve(Path::new("/f")), Err(FsError::NotFound));

        let after = tree.node(id).unwrap().times;
        assert!(after.ctime > before.ctime);
        assert_eq!(after.mtime, before.mtime);
        assert_eq!(after.atime, before.atime);
        assert_eq!(tree.node(id).unwrap().name, "g");
    }

    #[test]
    fn test_rename_replaces_file() {
        let (mut tree, clock) = setup();
        let src = tree.create_file(Path::new("/src"), false, &clock).unwrap();
        let dst = tree.create_file(Path::new("/dst"), false, &clock).unwrap();

        tree.rename(Path::new("/src"), Path::new("/dst"), &clock, &never_open).unwrap();
        assert_eq!(tree.resolve(Path::new("/dst")).unwrap(), src);
        assert!(tree.node(dst).is_err());
    }

    #[test]
    fn test_rename_type_conflicts() {
        let (mut tree, clock) = setup();
        tree.create_dir_all(Path::new("/full/x"), &clock).unwrap();
        tree.create_directory(Path::new("/empty"), &clock).unwrap();
        tree.create_directory(Path::new("/dir"), &clock).unwrap();
        tree.create_file(Path::new("/file"), false, &clock).unwrap();

        assert_eq!(
            tree.rename(Path::new("/dir"), Path::new("/full"), &clock, &never_open),
            Err(FsError::DirectoryNotEmpty)
        );
        assert_eq!(
            tree.rename(Path::new("/file"), Path::new("/empty"), &clock, &never_open),
            Err(FsError::IsADirectory)
        );
        assert_eq!(
            tree.rename(Path::new("/dir"), Path::new("/file"), &clock, &never_open),
            Err(FsError::NotADirectory)
        );
        assert_eq!(
            tree.rename(Path::new("/dir"), Path::new("/dir/inside"), &clock, &never_open),
            Err(FsError::InvalidArgument)
        );

        tree.rename(Path::new("/dir"), Path::new("/empty"), &clock, &never_open).unwrap();
        assert!(tree.resolve(Path::new("/empty")).is_ok());
        assert_eq!(tree.resolve(Path::new("/dir")), Err(FsError::NotFound));
    }

    #[test]
    fn test_rename_onto_itself_is_noop() {
        let (mut tree, clock) = setup();
        let id = tree.create_file(Path::new("/f"), false, &clock).unwrap();
        let before = tree.node(id).unwrap().times;
        tree.rename(Path::new("/f"), Path::new("/./f"), &clock, &never_open).unwrap();
        assert_eq!(tree.node(id).unwrap().times, before);
    }
}
