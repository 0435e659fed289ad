//! The backend-agnostic handle consumers read and seek through.
//!
//! # Lifecycle
//!
//! 1. Construct with a backend-specific constructor
//!    ([`native_file`](Handle::native_file),
//!    [`memory_range`](Handle::memory_range),
//!    [`memory_range_mut`](Handle::memory_range_mut),
//!    [`foreign_stream`](Handle::foreign_stream)) or [`Handle::new`]
//! 2. [`open`](Handle::open) with [`AccessFlags`]
//! 3. Any sequence of [`read`](Handle::read), [`write`](Handle::write),
//!    [`seek`](Handle::seek), [`offset`](Handle::offset), [`size`](Handle::size)
//! 4. [`close`](Handle::close)
//!
//! Dropping an open handle closes it and logs a warning. That is a safety net;
//! callers are expected to close explicitly so teardown errors reach them.
//!
//! # Example
//!
//! ```rust
//! use anyio_backend::{AccessFlags, Handle, Whence};
//!
//! let image = b"MZ\x90\x00\x03\x00\x00\x00";
//! let mut handle = Handle::memory_range(image);
//! handle.open(AccessFlags::READ)?;
//!
//! let mut magic = [0u8; 2];
//! assert_eq!(handle.read(&mut magic)?, 2);
//! assert_eq!(&magic, b"MZ");
//!
//! assert_eq!(handle.seek(-2, Whence::End)?, 6);
//! assert_eq!(handle.size()?, 8);
//!
//! handle.close()?;
//! # Ok::<(), anyio_backend::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! A handle has no internal locking; use it from one thread at a time. For
//! concurrent access give each thread its own [`try_clone`](Handle::try_clone).

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::types::resolve_offset;
use crate::{
    AccessFlags, Error, ForeignObject, ForeignStream, IoBackend, MemoryRange, NativeFile, Whence,
};

/// A random-access I/O handle over exactly one backend.
///
/// The backend is fixed at construction. Open state and access flags are
/// tracked here, so every backend gets the same checks:
///
/// - `read`, `write`, `seek`, `offset` and `size` fail with
///   [`Error::NotOpen`] while closed
/// - `read` needs [`AccessFlags::READ`], `write` needs [`AccessFlags::WRITE`]
/// - `seek` rejects negative targets before the backend is touched
#[derive(Debug)]
pub struct Handle<B: IoBackend> {
    backend: B,
    access_flags: AccessFlags,
    is_open: bool,
}

impl Handle<NativeFile> {
    /// A closed handle over the file at `path`.
    pub fn native_file(path: impl Into<PathBuf>) -> Self {
        Self::new(NativeFile::new(path))
    }
}

impl<'a> Handle<MemoryRange<'a>> {
    /// A closed, read-only handle over borrowed memory.
    pub fn memory_range(bytes: &'a [u8]) -> Self {
        Self::new(MemoryRange::new(bytes))
    }

    /// A closed, writable handle over borrowed memory.
    pub fn memory_range_mut(bytes: &'a mut [u8]) -> Self {
        Self::new(MemoryRange::new_mut(bytes))
    }
}

impl<F: ForeignObject + ?Sized> Handle<ForeignStream<F>> {
    /// A closed handle over a host-owned stream object.
    pub fn foreign_stream(object: Arc<F>) -> Self {
        Self::new(ForeignStream::new(object))
    }
}

impl<B: IoBackend> Handle<B> {
    /// Wrap a closed backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            access_flags: AccessFlags::empty(),
            is_open: false,
        }
    }

    /// The backend behind this handle.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Flags the handle is currently open with; empty while closed.
    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    /// Returns `true` between a successful `open` and the next `close`.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Open the underlying resource.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyOpen`] if the handle is open
    /// - [`Error::InvalidAccessFlags`] for empty flags, unknown bits or
    ///   `TRUNCATE` without `WRITE`
    /// - whatever the backend reports when acquiring the resource; the handle
    ///   stays closed in that case
    pub fn open(&mut self, flags: AccessFlags) -> Result<(), Error> {
        if self.is_open {
            return Err(Error::AlreadyOpen);
        }
        if !flags.is_valid() {
            return Err(Error::InvalidAccessFlags { flags });
        }
        self.backend.open(flags)?;
        self.access_flags = flags;
        self.is_open = true;
        debug!("opened {} ({flags})", self.backend.describe());
        Ok(())
    }

    /// Close the underlying resource.
    ///
    /// The handle is closed on return even when backend teardown fails; the
    /// teardown error is still returned.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the handle is already closed
    /// - whatever the backend reports during teardown
    pub fn close(&mut self) -> Result<(), Error> {
        if !self.is_open {
            return Err(Error::NotOpen { operation: "close" });
        }
        let result = self.backend.close();
        self.is_open = false;
        self.access_flags = AccessFlags::empty();
        match &result {
            Ok(()) => debug!("closed {}", self.backend.describe()),
            Err(e) => warn!("teardown of {} failed: {e}", self.backend.describe()),
        }
        result
    }

    /// Read into `buf` from the current offset.
    ///
    /// Returns the number of bytes read. Native files and memory ranges only
    /// return fewer than `buf.len()` at end of resource; `0` means the end
    /// has been reached. Foreign streams pass through whatever count the
    /// host object delivers.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the handle is closed
    /// - [`Error::NotReadable`] if the handle was opened without `READ`
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.ensure_open("read")?;
        if !self.access_flags.is_read() {
            return Err(Error::NotReadable {
                flags: self.access_flags,
            });
        }
        let count = self.backend.read(buf)?;
        trace!("read {count} of {} bytes", buf.len());
        Ok(count)
    }

    /// Write `data` at the current offset.
    ///
    /// Returns the number of bytes written. A fixed-size medium may accept
    /// fewer bytes at its end; any other short write is an error.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the handle is closed
    /// - [`Error::NotWritable`] if the handle was opened without `WRITE`
    /// - [`Error::PartialWrite`] on a short write that is not end of resource
    pub fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        self.ensure_open("write")?;
        if !self.access_flags.is_write() {
            return Err(Error::NotWritable {
                flags: self.access_flags,
            });
        }
        let count = self.backend.write(data)?;
        trace!("wrote {count} of {} bytes", data.len());
        Ok(count)
    }

    /// Move the current offset and return the new absolute offset.
    ///
    /// Seeking past the end succeeds; the next read returns `0`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the handle is closed
    /// - [`Error::InvalidSeek`] if the target would be negative; the offset is
    ///   left unchanged
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
        self.ensure_open("seek")?;
        if offset < 0 {
            let (current, size) = match whence {
                Whence::Start => (0, 0),
                Whence::Current => (self.backend.offset()?, 0),
                Whence::End => (0, self.backend.size()?),
            };
            if resolve_offset(offset, whence, current, size).is_none() {
                return Err(Error::InvalidSeek { offset, whence });
            }
        }
        let position = self.backend.seek(offset, whence)?;
        trace!("seek {offset} from {whence} -> {position}");
        Ok(position)
    }

    /// Current absolute offset.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the handle is closed
    pub fn offset(&mut self) -> Result<u64, Error> {
        self.ensure_open("get offset")?;
        self.backend.offset()
    }

    /// Total addressable length of the resource.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the handle is closed
    pub fn size(&mut self) -> Result<u64, Error> {
        self.ensure_open("get size")?;
        self.backend.size()
    }

    /// Whether the underlying resource exists and is reachable.
    ///
    /// Answers the same whether the handle is open or closed.
    pub fn exists(&self) -> Result<bool, Error> {
        self.backend.exists()
    }

    /// Seek to `offset` from the start, then read.
    pub fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize, Error> {
        self.seek(start_offset(offset)?, Whence::Start)?;
        self.read(buf)
    }

    /// Seek to `offset` from the start, then write.
    pub fn write_at(&mut self, data: &[u8], offset: u64) -> Result<usize, Error> {
        self.seek(start_offset(offset)?, Whence::Start)?;
        self.write(data)
    }

    /// Fill `buf` completely from `offset`.
    ///
    /// # Errors
    ///
    /// - [`Error::ResourceUnavailable`] if the resource ends before `buf` is
    ///   full
    pub fn read_exact_at(&mut self, buf: &mut [u8], offset: u64) -> Result<(), Error> {
        let mut filled = self.read_at(buf, offset)?;
        while filled < buf.len() {
            let count = self.read(&mut buf[filled..])?;
            if count == 0 {
                return Err(Error::unavailable(
                    "read",
                    format!(
                        "resource ended after {filled} of {} bytes at offset {offset}",
                        buf.len()
                    ),
                ));
            }
            filled += count;
        }
        Ok(())
    }

    /// An independent handle over the same resource, offset at zero.
    ///
    /// An open handle yields an open clone with the same access flags; a
    /// closed one yields a closed clone. Foreign-stream clones share the host
    /// object and therefore its position.
    ///
    /// # Errors
    ///
    /// - [`Error::CloneFailed`] if the backend could not be duplicated; the
    ///   source handle is unaffected
    pub fn try_clone(&self) -> Result<Self, Error> {
        let backend = self
            .backend
            .try_clone()
            .map_err(|source| Error::CloneFailed {
                resource: self.backend.describe(),
                source: Box::new(source),
            })?;
        debug!("cloned {}", self.backend.describe());
        Ok(Self {
            backend,
            access_flags: self.access_flags,
            is_open: self.is_open,
        })
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), Error> {
        if self.is_open {
            Ok(())
        } else {
            Err(Error::NotOpen { operation })
        }
    }
}

impl<B: IoBackend> Drop for Handle<B> {
    fn drop(&mut self) {
        if !self.is_open {
            return;
        }
        warn!("{} dropped while open, closing", self.backend.describe());
        if let Err(e) = self.backend.close() {
            warn!("teardown of {} failed: {e}", self.backend.describe());
        }
    }
}

fn start_offset(offset: u64) -> Result<i64, Error> {
    i64::try_from(offset).map_err(|_| Error::SeekOutOfRange { target: offset })
}

impl<B: IoBackend> std::io::Read for Handle<B> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Handle::read(self, buf).map_err(Into::into)
    }
}

impl<B: IoBackend> std::io::Write for Handle<B> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Handle::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<B: IoBackend> std::io::Seek for Handle<B> {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        let (offset, whence) = match pos {
            std::io::SeekFrom::Start(n) => (start_offset(n)?, Whence::Start),
            std::io::SeekFrom::Current(n) => (n, Whence::Current),
            std::io::SeekFrom::End(n) => (n, Whence::End),
        };
        Handle::seek(self, offset, whence).map_err(Into::into)
    }
}
