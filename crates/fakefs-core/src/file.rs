// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `std::io` adapter over an engine handle

use std::io::{self, SeekFrom};

use tracing::warn;

use crate::error::FsResult;
use crate::vfs::{FsCore, COMPONENT};
use crate::{HandleId, Metadata};

/// An open file borrowed from an [`FsCore`]
///
/// Reads, writes and flushes go through the engine, so they follow the same
/// timestamp rules as the handle-id API. Dropping an `OpenFile` closes it;
/// use [`OpenFile::close`] to observe the result of the final flush.
#[derive(Debug)]
pub struct OpenFile<'fs> {
    fs: &'fs FsCore,
    id: HandleId,
    closed: bool,
}

impl<'fs> OpenFile<'fs> {
    pub(crate) fn new(fs: &'fs FsCore, id: HandleId) -> Self {
        Self {
            fs,
            id,
            closed: false,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Read everything from the cursor to the end of the file
    pub fn read_all(&mut self) -> FsResult<Vec<u8>> {
        self.fs.read(self.id, None)
    }

    pub fn metadata(&self) -> FsResult<Metadata> {
        self.fs.fstat(self.id)
    }

    pub fn set_len(&mut self, len: u64) -> FsResult<()> {
        self.fs.set_len(self.id, len)
    }

    pub fn close(mut self) -> FsResult<()> {
        self.closed = true;
        self.fs.close(self.id)
    }
}

impl io::Read for OpenFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.fs.read(self.id, Some(buf.len()))?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl io::Write for OpenFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.fs.write(self.id, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.fs.flush(self.id)?)
    }
}

impl io::Seek for OpenFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.fs.seek(self.id, pos)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.fs.tell(self.id)?)
    }
}

impl Drop for OpenFile<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.fs.close(self.id) {
            warn!(
                component = COMPONENT,
                handle = %self.id,
                error = %err,
                "implicit close of dropped file failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::FsError;
    use crate::{FsConfig, OpenMode};
    use std::io::{Read, Seek, Write};
    use std::path::Path;
    use std::sync::Arc;

    fn core() -> FsCore {
        crate::testing::init_test_logging();
        FsCore::with_clock(FsConfig::default(), Arc::new(ManualClock::default())).unwrap()
    }

    #[test]
    fn test_io_traits_round_trip() {
        let fs = core();
        let mut file = fs.open_file(Path::new("/notes.txt"), OpenMode::WritePlus).unwrap();
        writeln!(file, "line one").unwrap();
        file.write_all(b"line two\n").unwrap();
        file.flush().unwrap();

        file.rewind().unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        assert_eq!(text, "line one\nline two\n");
        assert_eq!(file.stream_position().unwrap(), 18);
        assert_eq!(file.metadata().unwrap().size, 18);
        file.close().unwrap();
    }

    #[test]
    fn test_drop_closes_handle() {
        let fs = core();
        {
            let mut file = fs.open_file(Path::new("/f"), OpenMode::Write).unwrap();
            file.write_all(b"abc").unwrap();
            assert_eq!(fs.open_handles(), 1);
        }
        assert_eq!(fs.open_handles(), 0);

        // The implicit close flushed the pending write
        let meta = fs.stat(Path::new("/f")).unwrap();
        assert!(meta.modified_at() > meta.created_at());
    }

    #[cfg(unix)]
    #[test]
    fn test_errors_map_to_io_kinds() {
        let fs = core();
        fs.create_file(Path::new("/ro"), b"data").unwrap();
        let mut file = fs.open_file(Path::new("/ro"), OpenMode::Read).unwrap();

        let err = file.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(file.set_len(0), Err(FsError::PermissionDenied));

        let err = file.seek(SeekFrom::Current(-1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(file.read_all().unwrap(), b"data");
    }

    #[test]
    fn test_drop_after_reset_does_not_panic() {
        let fs = core();
        let file = fs.open_file(Path::new("/f"), OpenMode::Write).unwrap();
        fs.reset();
        let id = file.id();
        drop(file);
        assert_eq!(fs.close(id), Err(FsError::HandleClosed));
    }
}
