// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core type definitions for FakeFS

use serde::{Deserialize, Serialize};

use crate::error::FsError;

/// Nanoseconds since the Unix epoch
pub type Timestamp = i64;

/// Opaque handle identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl HandleId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// File timestamps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTimes {
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
    pub birthtime: Timestamp,
}

impl FileTimes {
    /// All four timestamps set to the same instant
    pub fn at(now: Timestamp) -> Self {
        Self {
            atime: now,
            mtime: now,
            ctime: now,
            birthtime: now,
        }
    }

    /// Content change: mtime and ctime move together
    pub(crate) fn touch_modified(&mut self, now: Timestamp) {
        self.mtime = now;
        self.ctime = now;
    }

    /// Metadata-only change
    pub(crate) fn touch_changed(&mut self, now: Timestamp) {
        self.ctime = now;
    }

    pub(crate) fn touch_accessed(&mut self, now: Timestamp) {
        self.atime = now;
    }
}

/// Kind of a filesystem node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    File,
    Directory,
}

/// Permission bits for one class (user, group or other)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileMode {
    pub read: bool,
    pub write: bool,
    pub exec: bool,
}

impl FileMode {
    fn from_bits(bits: u32) -> Self {
        Self {
            read: bits & 0o4 != 0,
            write: bits & 0o2 != 0,
            exec: bits & 0o1 != 0,
        }
    }
}

/// Result of a `stat` query. Reading it never counts as an access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub kind: NodeType,
    pub size: u64,
    /// Permission bits only (`0o7777` range)
    pub permissions: u32,
    pub uid: u32,
    pub gid: u32,
    pub times: FileTimes,
}

impl Metadata {
    /// Full `st_mode`: file type bits plus permission bits
    pub fn mode(&self) -> u32 {
        let type_bits = match self.kind {
            NodeType::File => libc::S_IFREG as u32,
            NodeType::Directory => libc::S_IFDIR as u32,
        };
        type_bits | self.permissions
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeType::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeType::Directory
    }

    pub fn created_at(&self) -> Timestamp {
        self.times.birthtime
    }

    pub fn modified_at(&self) -> Timestamp {
        self.times.mtime
    }

    pub fn metadata_changed_at(&self) -> Timestamp {
        self.times.ctime
    }

    pub fn accessed_at(&self) -> Timestamp {
        self.times.atime
    }

    pub fn mode_user(&self) -> FileMode {
        FileMode::from_bits(self.permissions >> 6)
    }

    pub fn mode_group(&self) -> FileMode {
        FileMode::from_bits(self.permissions >> 3)
    }

    pub fn mode_other(&self) -> FileMode {
        FileMode::from_bits(self.permissions)
    }
}

/// The six stdio-style open modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// `r`
    Read,
    /// `r+`
    ReadPlus,
    /// `w`
    Write,
    /// `w+`
    WritePlus,
    /// `a`
    Append,
    /// `a+`
    AppendPlus,
}

impl OpenMode {
    pub const ALL: [OpenMode; 6] = [
        OpenMode::Read,
        OpenMode::ReadPlus,
        OpenMode::Write,
        OpenMode::WritePlus,
        OpenMode::Append,
        OpenMode::AppendPlus,
    ];

    pub fn can_read(self) -> bool {
        !matches!(self, OpenMode::Write | OpenMode::Append)
    }

    pub fn can_write(self) -> bool {
        self != OpenMode::Read
    }

    /// Whether opening a missing path creates the file
    pub fn creates(self) -> bool {
        !matches!(self, OpenMode::Read | OpenMode::ReadPlus)
    }

    /// Whether opening an existing file discards its content
    pub fn truncates(self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::WritePlus)
    }

    /// Whether every write lands at the end of the file
    pub fn appends(self) -> bool {
        matches!(self, OpenMode::Append | OpenMode::AppendPlus)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::ReadPlus => "r+",
            OpenMode::Write => "w",
            OpenMode::WritePlus => "w+",
            OpenMode::Append => "a",
            OpenMode::AppendPlus => "a+",
        }
    }
}

impl std::fmt::Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OpenMode {
    type Err = FsError;

    /// Accepts `r`, `r+`, `w`, `w+`, `a`, `a+` with an optional `b` or `t`
    /// flag anywhere after the first character (`rb`, `r+b`, `rb+`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let base = chars.next().ok_or(FsError::InvalidName)?;
        let mut plus = false;
        let mut flag_seen = false;
        for c in chars {
            match c {
                '+' if !plus => plus = true,
                'b' | 't' if !flag_seen => flag_seen = true,
                _ => return Err(FsError::InvalidName),
            }
        }

        match (base, plus) {
            ('r', false) => Ok(OpenMode::Read),
            ('r', true) => Ok(OpenMode::ReadPlus),
            ('w', false) => Ok(OpenMode::Write),
            ('w', true) => Ok(OpenMode::WritePlus),
            ('a', false) => Ok(OpenMode::Append),
            ('a', true) => Ok(OpenMode::AppendPlus),
            _ => Err(FsError::InvalidName),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_mode_table() {
        // (mode, creates, truncates, read, write, appends)
        let table = [
            (OpenMode::Read, false, false, true, false, false),
            (OpenMode::ReadPlus, false, false, true, true, false),
            (OpenMode::Write, true, true, false, true, false),
            (OpenMode::WritePlus, true, true, true, true, false),
            (OpenMode::Append, true, false, false, true, true),
            (OpenMode::AppendPlus, true, false, true, true, true),
        ];
        for (mode, creates, truncates, read, write, appends) in table {
            assert_eq!(mode.creates(), creates, "{mode}");
            assert_eq!(mode.truncates(), truncates, "{mode}");
            assert_eq!(mode.can_read(), read, "{mode}");
            assert_eq!(mode.can_write(), write, "{mode}");
            assert_eq!(mode.appends(), appends, "{mode}");
        }
    }

    #[test]
    fn test_open_mode_parse() {
        for mode in OpenMode::ALL {
            assert_eq!(mode.as_str().parse::<OpenMode>(), Ok(mode));
        }
        assert_eq!("rb".parse::<OpenMode>(), Ok(OpenMode::Read));
        assert_eq!("r+b".parse::<OpenMode>(), Ok(OpenMode::ReadPlus));
        assert_eq!("ab+".parse::<OpenMode>(), Ok(OpenMode::AppendPlus));
        assert_eq!("wt".parse::<OpenMode>(), Ok(OpenMode::Write));
    }

    #[test]
    fn test_open_mode_parse_rejects_garbage() {
        for bad in ["", "x", "r++", "rbb", "+r", "rw"] {
            assert_eq!(bad.parse::<OpenMode>(), Err(FsError::InvalidName), "{bad:?}");
        }
    }

    #[test]
    fn test_metadata_mode_bits() {
        let meta = Metadata {
            kind: NodeType::File,
            size: 0,
            permissions: 0o640,
            uid: 0,
            gid: 0,
            times: FileTimes::at(1),
        };
        assert_eq!(meta.mode() & libc::S_IFMT as u32, libc::S_IFREG as u32);
        assert_eq!(meta.mode() & 0o777, 0o640);
        assert_eq!(
            meta.mode_user(),
            FileMode {
                read: true,
                write: true,
                exec: false
            }
        );
        assert!(meta.mode_group().read && !meta.mode_group().write);
        assert_eq!(
            meta.mode_other(),
            FileMode {
                read: false,
                write: false,
                exec: false
            }
        );
    }
}
