//! Backend over a file on the local filesystem.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::types::to_seek_from;
use crate::{AccessFlags, Error, IoBackend, Whence};

/// A file addressed by path.
///
/// The OS descriptor exists only while the backend is open. Opening with
/// [`AccessFlags::WRITE`] creates the file if it is missing;
/// [`AccessFlags::TRUNCATE`] empties it.
#[derive(Debug)]
pub struct NativeFile {
    path: PathBuf,
    file: Option<File>,
    flags: AccessFlags,
}

impl NativeFile {
    /// Create a closed backend for `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            flags: AccessFlags::empty(),
        }
    }

    /// The path this backend resolves on open.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, operation: &'static str, source: std::io::Error) -> Error {
        Error::FileUnavailable {
            operation,
            path: self.path.clone(),
            source,
        }
    }

    fn file(&mut self, operation: &'static str) -> Result<&mut File, Error> {
        self.file.as_mut().ok_or(Error::NotOpen { operation })
    }

    fn open_with(&self, flags: AccessFlags, create: bool) -> Result<File, Error> {
        OpenOptions::new()
            .read(flags.is_read())
            .write(flags.is_write())
            .create(create && flags.is_write())
            .truncate(flags.is_truncate())
            .open(&self.path)
            .map_err(|e| self.io_error("open", e))
    }
}

impl IoBackend for NativeFile {
    fn open(&mut self, flags: AccessFlags) -> Result<(), Error> {
        let file = self.open_with(flags, true)?;
        self.file = Some(file);
        self.flags = flags;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        // Errors on drop are lost; surface delayed write failures here.
        if self.flags.is_write() {
            file.sync_all().map_err(|e| self.io_error("close", e))?;
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let file = self.file("read")?;
        read_full(file, buf).map_err(|e| self.io_error("read", e))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        let file = self.file("write")?;
        let mut total = 0;
        while total < data.len() {
            match file.write(&data[total..]) {
                Ok(0) => {
                    return Err(Error::PartialWrite {
                        requested: data.len(),
                        written: total,
                        source: None,
                    });
                }
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if total > 0 || is_out_of_space(&e) => {
                    return Err(Error::PartialWrite {
                        requested: data.len(),
                        written: total,
                        source: Some(Box::new(e)),
                    });
                }
                Err(e) => return Err(self.io_error("write", e)),
            }
        }
        Ok(total)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
        let target = to_seek_from(offset, whence).ok_or(Error::InvalidSeek { offset, whence })?;
        let file = self.file("seek")?;
        match file.seek(target) {
            Ok(position) => Ok(position),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
                Err(Error::InvalidSeek { offset, whence })
            }
            Err(e) => Err(self.io_error("seek", e)),
        }
    }

    fn offset(&mut self) -> Result<u64, Error> {
        let file = self.file("get offset")?;
        file.stream_position()
            .map_err(|e| self.io_error("get offset", e))
    }

    fn size(&mut self) -> Result<u64, Error> {
        let file = self.file("get size")?;
        file.metadata()
            .map(|m| m.len())
            .map_err(|e| self.io_error("get size", e))
    }

    fn exists(&self) -> Result<bool, Error> {
        self.path
            .try_exists()
            .map_err(|e| self.io_error("exists", e))
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn try_clone(&self) -> Result<Self, Error> {
        let file = match self.file {
            // Never recreate or truncate the source's file.
            Some(_) => Some(self.open_with(self.flags.without_truncate(), false)?),
            None => None,
        };
        Ok(Self {
            path: self.path.clone(),
            file,
            flags: self.flags.without_truncate(),
        })
    }
}

/// Read until `buf` is full or end of file.
///
/// An error after some bytes were delivered is dropped and the count
/// returned; the reader reports it again on the next call.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) if total > 0 => break,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

fn is_out_of_space(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::WriteZero | std::io::ErrorKind::StorageFull
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn new_does_not_touch_disk() {
        let dir = tempfile::tempdir().unwrap();
        let backend = NativeFile::new(dir.path().join("absent.bin"));
        assert!(!backend.is_open());
        assert!(!backend.exists().unwrap());
    }

    #[test]
    fn open_missing_file_for_read_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = NativeFile::new(dir.path().join("absent.bin"));
        let err = backend.open(AccessFlags::READ).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
        assert!(!backend.is_open());
    }

    #[test]
    fn open_for_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.bin");
        let mut backend = NativeFile::new(&path);
        backend.open(AccessFlags::WRITE).unwrap();
        assert_eq!(backend.write(b"abc").unwrap(), 3);
        backend.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn truncate_empties_file() {
        let file = temp_file(b"old contents");
        let mut backend = NativeFile::new(file.path());
        backend
            .open(AccessFlags::READ_WRITE | AccessFlags::TRUNCATE)
            .unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        backend.close().unwrap();
    }

    #[test]
    fn read_fills_buffer_until_eof() {
        let file = temp_file(b"0123456789");
        let mut backend = NativeFile::new(file.path());
        backend.open(AccessFlags::READ).unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(backend.read(&mut buf).unwrap(), 10);
        assert_eq!(&buf[..10], b"0123456789");
        assert_eq!(backend.read(&mut buf).unwrap(), 0);
        backend.close().unwrap();
    }

    /// Hands out fixed chunks, then fails on every later call.
    struct FlakyReader {
        chunks: Vec<&'static [u8]>,
        failures: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.chunks.is_empty() {
                self.failures += 1;
                return Err(std::io::Error::other("device error"));
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn read_error_after_progress_keeps_delivered_bytes() {
        let mut reader = FlakyReader {
            chunks: vec![&b"MZ"[..], &b"\x90"[..]],
            failures: 0,
        };
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"MZ\x90");
        assert_eq!(reader.failures, 1);

        let err = read_full(&mut reader, &mut buf).unwrap_err();
        assert_eq!(err.to_string(), "device error");
    }

    #[test]
    fn seek_past_end_then_read_returns_zero() {
        let file = temp_file(b"short");
        let mut backend = NativeFile::new(file.path());
        backend.open(AccessFlags::READ).unwrap();

        assert_eq!(backend.seek(100, Whence::Start).unwrap(), 100);
        let mut buf = [0u8; 4];
        assert_eq!(backend.read(&mut buf).unwrap(), 0);
        backend.close().unwrap();
    }

    #[test]
    fn seek_before_start_is_invalid() {
        let file = temp_file(b"data");
        let mut backend = NativeFile::new(file.path());
        backend.open(AccessFlags::READ).unwrap();
        let err = backend.seek(-1, Whence::Start).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSeek);
        backend.close().unwrap();
    }

    #[test]
    fn clone_of_open_backend_has_own_offset() {
        let file = temp_file(b"abcdef");
        let mut backend = NativeFile::new(file.path());
        backend.open(AccessFlags::READ).unwrap();
        backend.seek(4, Whence::Start).unwrap();

        let mut clone = backend.try_clone().unwrap();
        assert!(clone.is_open());
        assert_eq!(clone.offset().unwrap(), 0);
        assert_eq!(backend.offset().unwrap(), 4);

        clone.close().unwrap();
        backend.close().unwrap();
    }

    #[test]
    fn clone_never_truncates() {
        let file = temp_file(b"keep me");
        let mut backend = NativeFile::new(file.path());
        backend
            .open(AccessFlags::READ_WRITE | AccessFlags::TRUNCATE)
            .unwrap();
        backend.write(b"kept").unwrap();
        backend.close().unwrap();
        backend.open(AccessFlags::READ_WRITE).unwrap();

        let mut clone = backend.try_clone().unwrap();
        assert_eq!(clone.size().unwrap(), 4);
        clone.close().unwrap();
        backend.close().unwrap();
    }

    #[test]
    fn clone_of_closed_backend_stays_closed() {
        let backend = NativeFile::new("/nonexistent/anyio/backend.bin");
        let clone = backend.try_clone().unwrap();
        assert!(!clone.is_open());
        assert_eq!(clone.path(), backend.path());
    }

    #[test]
    fn close_releases_descriptor() {
        let file = temp_file(b"x");
        let mut backend = NativeFile::new(file.path());
        backend.open(AccessFlags::READ).unwrap();
        backend.close().unwrap();
        assert!(!backend.is_open());
        let mut buf = [0u8; 1];
        assert_eq!(backend.read(&mut buf).unwrap_err().kind(), ErrorKind::NotOpen);
    }
}
