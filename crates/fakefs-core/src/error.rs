// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for FakeFS Core

use std::io;

/// Core filesystem error type
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("permission denied")]
    PermissionDenied,
    #[error("handle is closed")]
    HandleClosed,
    #[error("bad file handle")]
    BadHandle,
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("name not allowed")]
    InvalidName,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("file too large")]
    FileTooLarge,
}

impl FsError {
    /// POSIX errno an interception layer should surface for this error
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::IsADirectory => libc::EISDIR,
            FsError::PermissionDenied => libc::EACCES,
            FsError::HandleClosed | FsError::BadHandle => libc::EBADF,
            FsError::DirectoryNotEmpty => libc::ENOTEMPTY,
            FsError::InvalidArgument | FsError::InvalidName => libc::EINVAL,
            FsError::TooManyOpenFiles => libc::EMFILE,
            FsError::FileTooLarge => libc::EFBIG,
        }
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        io::Error::from_raw_os_error(err.errno())
    }
}

pub type FsResult<T> = Result<T, FsError>;
