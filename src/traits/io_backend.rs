//! The per-medium capability set behind a [`Handle`](crate::Handle).

use crate::{AccessFlags, Error, Whence};

/// Backend operations for one kind of byte-addressable resource.
///
/// A backend is owned exclusively by one [`Handle`](crate::Handle). The handle
/// checks open state and access flags before delegating, so backends may
/// assume `read`/`write`/`seek`/`offset`/`size` are only called while open
/// and with the matching access bit set.
///
/// # Contract
///
/// - `read` fills as much of `buf` as the resource allows. A short count means
///   end of resource for native and memory media; `0` is end of resource.
/// - `write` returns the bytes accepted. A short count at the end of a
///   fixed-size medium is not an error; any other short write is
///   [`Error::PartialWrite`].
/// - `seek` may assume the handle has already rejected negative targets. No
///   upper bound is enforced.
/// - `try_clone` returns a backend over the same resource with its offset at
///   zero, opened with the same access flags when the source is open.
///
/// # Object Safety
///
/// Every method except `try_clone` is object-safe, so `Box<dyn IoBackend>` can
/// be used behind a handle that is never cloned.
pub trait IoBackend {
    /// Acquire the resource with the given (already validated) flags.
    ///
    /// # Errors
    ///
    /// - [`Error::FileUnavailable`] / [`Error::ResourceUnavailable`] if the
    ///   resource cannot be reached with the requested access
    /// - [`Error::ForeignProtocolViolation`] if a foreign open call fails
    fn open(&mut self, flags: AccessFlags) -> Result<(), Error>;

    /// Release the resource. The backend must consider itself closed on
    /// return even when an error is reported.
    fn close(&mut self) -> Result<(), Error>;

    /// Read into `buf` from the current offset.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Write `data` at the current offset.
    fn write(&mut self, data: &[u8]) -> Result<usize, Error>;

    /// Move the current offset and return the new absolute offset.
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error>;

    /// Current absolute offset.
    fn offset(&mut self) -> Result<u64, Error>;

    /// Total addressable length of the resource.
    fn size(&mut self) -> Result<u64, Error>;

    /// Whether the underlying resource exists, independent of open state.
    fn exists(&self) -> Result<bool, Error>;

    /// Whether the backend currently holds the resource open.
    fn is_open(&self) -> bool;

    /// Short human-readable description used in logs and errors.
    fn describe(&self) -> String;

    /// Build an independent backend over the same resource.
    fn try_clone(&self) -> Result<Self, Error>
    where
        Self: Sized;
}

impl<B: IoBackend + ?Sized> IoBackend for Box<B> {
    fn open(&mut self, flags: AccessFlags) -> Result<(), Error> {
        (**self).open(flags)
    }

    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        (**self).read(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        (**self).write(data)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
        (**self).seek(offset, whence)
    }

    fn offset(&mut self) -> Result<u64, Error> {
        (**self).offset()
    }

    fn size(&mut self) -> Result<u64, Error> {
        (**self).size()
    }

    fn exists(&self) -> Result<bool, Error> {
        (**self).exists()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn try_clone(&self) -> Result<Self, Error> {
        Err(Error::unavailable(
            "clone",
            format!("boxed backend {} cannot be cloned", self.describe()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_backend_is_object_safe() {
        fn _check(_: &dyn IoBackend) {}
    }

    #[test]
    fn boxed_backend_delegates() {
        let data = *b"boxed";
        let mut backend: Box<dyn IoBackend + '_> =
            Box::new(crate::MemoryRange::new(&data));
        backend.open(AccessFlags::READ).unwrap();
        assert!(backend.is_open());
        assert_eq!(backend.size().unwrap(), 5);

        let mut buf = [0u8; 3];
        assert_eq!(backend.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"box");
        backend.close().unwrap();
        assert!(!backend.is_open());
    }

    #[test]
    fn boxed_backend_refuses_clone() {
        let data = [0u8; 4];
        let backend: Box<dyn IoBackend + '_> = Box::new(crate::MemoryRange::new(&data));
        let err = backend.try_clone().err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::ResourceUnavailable);
    }
}
