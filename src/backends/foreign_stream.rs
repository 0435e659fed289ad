//! Backend adapting a host-owned [`ForeignObject`].
//!
//! Every call is validated: the host may hand back anything, and a value of
//! the wrong type or size is reported as
//! [`Error::ForeignProtocolViolation`] rather than trusted. Errors raised by
//! the host are kept as the violation's source.

use std::sync::Arc;

use crate::{
    AccessFlags, Error, ForeignError, ForeignMethod, ForeignObject, ForeignValue, IoBackend,
    Whence,
};

/// A stream object shared with a host environment.
///
/// The object is held through an [`Arc`]: constructing the backend takes one
/// reference, every clone takes another, and dropping releases it. The
/// object itself is never closed by this crate, since the host owns it.
///
/// # Aliasing
///
/// Clones observe the *same* foreign object, including its position. Moving
/// the cursor through one clone moves it for all of them. The position is
/// never cached here; every offset query asks the object.
pub struct ForeignStream<F: ForeignObject + ?Sized> {
    object: Arc<F>,
    flags: AccessFlags,
    open: bool,
}

impl<F: ForeignObject + ?Sized> ForeignStream<F> {
    /// Wrap a shared foreign object, taking one reference.
    pub fn new(object: Arc<F>) -> Self {
        Self {
            object,
            flags: AccessFlags::empty(),
            open: false,
        }
    }

    /// The wrapped foreign object.
    pub fn object(&self) -> &Arc<F> {
        &self.object
    }

    /// Number of live references to the foreign object.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.object)
    }

    fn tell(&self, operation: &'static str) -> Result<u64, Error> {
        let value = self.object.tell().map_err(raised(operation, ForeignMethod::Tell))?;
        expect_offset(operation, ForeignMethod::Tell, value)
    }

    fn seek_raw(&self, operation: &'static str, offset: i64, whence: Whence) -> Result<(), Error> {
        self.object
            .seek(offset, whence)
            .map_err(raised(operation, ForeignMethod::Seek))?;
        Ok(())
    }

    fn require(&self, operation: &'static str, method: ForeignMethod) -> Result<(), Error> {
        if self.object.has_method(method) {
            Ok(())
        } else {
            Err(Error::unavailable(
                operation,
                format!("foreign object has no '{method}' method"),
            ))
        }
    }

    /// Size through seek-to-end, restoring the original position even when a
    /// step fails.
    fn size_by_seeking(&self) -> Result<u64, Error> {
        let original = self.tell("get size")?;
        let measured = self
            .seek_raw("get size", 0, Whence::End)
            .and_then(|()| self.tell("get size"));
        let restore_to = i64::try_from(original).map_err(|_| {
            Error::foreign("get size", format!("tell returned unrepresentable offset {original}"))
        });
        let restored = restore_to.and_then(|pos| self.seek_raw("get size", pos, Whence::Start));
        let size = measured?;
        restored?;
        Ok(size)
    }
}

impl<F: ForeignObject + ?Sized> std::fmt::Debug for ForeignStream<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignStream")
            .field("references", &self.reference_count())
            .field("flags", &self.flags)
            .field("open", &self.open)
            .finish()
    }
}

impl<F: ForeignObject + ?Sized> IoBackend for ForeignStream<F> {
    fn open(&mut self, flags: AccessFlags) -> Result<(), Error> {
        if flags.is_read() {
            self.require("open", ForeignMethod::Read)?;
        }
        if flags.is_write() {
            self.require("open", ForeignMethod::Write)?;
        }
        if self.object.has_method(ForeignMethod::Open) {
            self.object
                .open(flags)
                .map_err(raised("open", ForeignMethod::Open))?;
        } else if self.object.has_method(ForeignMethod::Seek) {
            self.seek_raw("open", 0, Whence::Start)?;
        }
        self.flags = flags;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.flags = AccessFlags::empty();
        self.open = false;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        let value = self
            .object
            .read(buf.len())
            .map_err(raised("read", ForeignMethod::Read))?;
        let ForeignValue::Bytes(bytes) = value else {
            return Err(Error::foreign(
                "read",
                format!("expected bytes, got {}", value.type_name()),
            ));
        };
        if bytes.len() > buf.len() {
            return Err(Error::foreign(
                "read",
                format!(
                    "returned {} bytes for a request of {}",
                    bytes.len(),
                    buf.len()
                ),
            ));
        }
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        if data.is_empty() {
            return Ok(0);
        }
        let value = self
            .object
            .write(data)
            .map_err(raised("write", ForeignMethod::Write))?;
        let ForeignValue::Integer(accepted) = value else {
            return Err(Error::foreign(
                "write",
                format!("expected accepted byte count, got {}", value.type_name()),
            ));
        };
        let accepted = usize::try_from(accepted)
            .ok()
            .filter(|n| *n <= data.len())
            .ok_or_else(|| {
                Error::foreign(
                    "write",
                    format!("reported {accepted} bytes accepted for {} written", data.len()),
                )
            })?;
        if accepted < data.len() {
            return Err(Error::PartialWrite {
                requested: data.len(),
                written: accepted,
                source: None,
            });
        }
        Ok(accepted)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
        if whence == Whence::Start && offset < 0 {
            return Err(Error::InvalidSeek { offset, whence });
        }
        self.seek_raw("seek", offset, whence)?;
        self.tell("seek")
    }

    fn offset(&mut self) -> Result<u64, Error> {
        self.tell("get offset")
    }

    fn size(&mut self) -> Result<u64, Error> {
        if self.object.has_method(ForeignMethod::GetSize) {
            let value = self
                .object
                .get_size()
                .map_err(raised("get size", ForeignMethod::GetSize))?;
            expect_offset("get size", ForeignMethod::GetSize, value)
        } else {
            self.size_by_seeking()
        }
    }

    fn exists(&self) -> Result<bool, Error> {
        Ok(true)
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn describe(&self) -> String {
        format!(
            "foreign stream ({}, {} references)",
            self.flags,
            self.reference_count()
        )
    }

    fn try_clone(&self) -> Result<Self, Error> {
        Ok(Self {
            object: Arc::clone(&self.object),
            flags: self.flags,
            open: self.open,
        })
    }
}

/// Wrap an error raised by the host as a protocol violation, keeping it as
/// the source.
fn raised(operation: &'static str, method: ForeignMethod) -> impl FnOnce(ForeignError) -> Error {
    move |source| Error::ForeignProtocolViolation {
        operation,
        details: format!("'{method}' raised {}", source.exception),
        source: Some(Box::new(source)),
    }
}

fn expect_offset(
    operation: &'static str,
    method: ForeignMethod,
    value: ForeignValue,
) -> Result<u64, Error> {
    match value {
        ForeignValue::Integer(n) => u64::try_from(n).map_err(|_| {
            Error::foreign(operation, format!("'{method}' returned negative value {n}"))
        }),
        other => Err(Error::foreign(
            operation,
            format!("'{method}' returned {}, expected int", other.type_name()),
        )),
    }
}
