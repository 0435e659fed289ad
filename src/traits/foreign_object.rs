//! Contract for stream objects owned by a host environment.
//!
//! A host (a scripting runtime, an embedding application) hands the library
//! a file-like object it owns and reference-counts itself. The
//! [`ForeignStream`](crate::ForeignStream) backend only ever talks to that
//! object through [`ForeignObject`], and never assumes the values it returns
//! are well formed: every call yields a loosely typed [`ForeignValue`] that
//! the adapter validates.
//!
//! # Example
//!
//! ```rust
//! use anyio_backend::{ForeignError, ForeignMethod, ForeignObject, ForeignValue, Whence};
//! use std::sync::Mutex;
//!
//! struct HostFile {
//!     data: Vec<u8>,
//!     position: Mutex<usize>,
//! }
//!
//! impl ForeignObject for HostFile {
//!     fn has_method(&self, method: ForeignMethod) -> bool {
//!         matches!(method, ForeignMethod::Read | ForeignMethod::Seek | ForeignMethod::Tell)
//!     }
//!
//!     fn read(&self, size: usize) -> Result<ForeignValue, ForeignError> {
//!         let mut pos = self.position.lock().unwrap();
//!         let end = (*pos + size).min(self.data.len());
//!         let start = (*pos).min(end);
//!         *pos = end;
//!         Ok(ForeignValue::Bytes(self.data[start..end].to_vec()))
//!     }
//!
//!     fn seek(&self, offset: i64, whence: Whence) -> Result<ForeignValue, ForeignError> {
//!         let mut pos = self.position.lock().unwrap();
//!         let base = match whence {
//!             Whence::Start => 0,
//!             Whence::Current => *pos as i64,
//!             Whence::End => self.data.len() as i64,
//!         };
//!         *pos = (base + offset) as usize;
//!         Ok(ForeignValue::None)
//!     }
//!
//!     fn tell(&self) -> Result<ForeignValue, ForeignError> {
//!         Ok(ForeignValue::Integer(*self.position.lock().unwrap() as i64))
//!     }
//! }
//! ```

use std::fmt;

use crate::{AccessFlags, Whence};

/// A loosely typed value returned by a foreign call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignValue {
    /// A byte sequence.
    Bytes(Vec<u8>),
    /// An integer.
    Integer(i64),
    /// The host's "no value".
    None,
    /// Any other host object, identified by its type name.
    Other(String),
}

impl ForeignValue {
    /// The host-side type name, used in protocol violation messages.
    pub fn type_name(&self) -> &str {
        match self {
            ForeignValue::Bytes(_) => "bytes",
            ForeignValue::Integer(_) => "int",
            ForeignValue::None => "None",
            ForeignValue::Other(name) => name,
        }
    }
}

/// Optional methods a foreign object may or may not expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignMethod {
    /// `read(size)`
    Read,
    /// `write(data)`
    Write,
    /// `seek(offset, whence)`
    Seek,
    /// `tell()`
    Tell,
    /// `get_size()`
    GetSize,
    /// `open(flags)`
    Open,
}

impl ForeignMethod {
    /// Name of the method on the host object.
    pub const fn name(&self) -> &'static str {
        match self {
            ForeignMethod::Read => "read",
            ForeignMethod::Write => "write",
            ForeignMethod::Seek => "seek",
            ForeignMethod::Tell => "tell",
            ForeignMethod::GetSize => "get_size",
            ForeignMethod::Open => "open",
        }
    }
}

impl fmt::Display for ForeignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error raised on the foreign side of a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{exception}: {message}")]
pub struct ForeignError {
    /// Host type name of the raised error (e.g. `IOError`).
    pub exception: String,
    /// The host's message.
    pub message: String,
}

impl ForeignError {
    /// Create a foreign error from an exception name and message.
    pub fn new(exception: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception: exception.into(),
            message: message.into(),
        }
    }

    /// The error produced when an optional method is missing.
    pub fn missing_method(method: ForeignMethod) -> Self {
        Self::new(
            "AttributeError",
            format!("object has no attribute '{}'", method.name()),
        )
    }
}

/// A file-like object owned by a host environment.
///
/// Methods take `&self`: the host object is shared between every handle
/// cloned from the same stream, and any mutable state lives behind the host's
/// own interior mutability. Synchronisation across threads, if the object
/// needs it, is the object's business.
///
/// Only [`read`](Self::read), [`seek`](Self::seek) and [`tell`](Self::tell)
/// are required. The rest default to raising the missing-method error, and
/// [`has_method`](Self::has_method) tells the adapter which ones really exist.
pub trait ForeignObject {
    /// Whether the object exposes `method`.
    fn has_method(&self, method: ForeignMethod) -> bool;

    /// Read up to `size` bytes. Expected to return [`ForeignValue::Bytes`].
    fn read(&self, size: usize) -> Result<ForeignValue, ForeignError>;

    /// Write `data`. Expected to return the accepted count as
    /// [`ForeignValue::Integer`].
    fn write(&self, data: &[u8]) -> Result<ForeignValue, ForeignError> {
        let _ = data;
        Err(ForeignError::missing_method(ForeignMethod::Write))
    }

    /// Move the object's position. The returned value is ignored.
    fn seek(&self, offset: i64, whence: Whence) -> Result<ForeignValue, ForeignError>;

    /// Current position. Expected to return [`ForeignValue::Integer`].
    fn tell(&self) -> Result<ForeignValue, ForeignError>;

    /// Total size. Expected to return [`ForeignValue::Integer`].
    fn get_size(&self) -> Result<ForeignValue, ForeignError> {
        Err(ForeignError::missing_method(ForeignMethod::GetSize))
    }

    /// Host-side open hook. The returned value is ignored.
    fn open(&self, flags: AccessFlags) -> Result<ForeignValue, ForeignError> {
        let _ = flags;
        Err(ForeignError::missing_method(ForeignMethod::Open))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    impl ForeignObject for Minimal {
        fn has_method(&self, method: ForeignMethod) -> bool {
            matches!(method, ForeignMethod::Read | ForeignMethod::Seek | ForeignMethod::Tell)
        }

        fn read(&self, _: usize) -> Result<ForeignValue, ForeignError> {
            Ok(ForeignValue::Bytes(Vec::new()))
        }

        fn seek(&self, _: i64, _: Whence) -> Result<ForeignValue, ForeignError> {
            Ok(ForeignValue::None)
        }

        fn tell(&self) -> Result<ForeignValue, ForeignError> {
            Ok(ForeignValue::Integer(0))
        }
    }

    #[test]
    fn foreign_object_is_object_safe() {
        fn _check(_: &dyn ForeignObject) {}
    }

    #[test]
    fn optional_methods_default_to_missing() {
        let obj = Minimal;
        let err = obj.get_size().unwrap_err();
        assert_eq!(err.exception, "AttributeError");
        assert!(err.message.contains("get_size"));
        assert!(obj.write(b"x").is_err());
        assert!(obj.open(AccessFlags::READ).is_err());
    }

    #[test]
    fn foreign_value_type_names() {
        assert_eq!(ForeignValue::Bytes(vec![1]).type_name(), "bytes");
        assert_eq!(ForeignValue::Integer(3).type_name(), "int");
        assert_eq!(ForeignValue::None.type_name(), "None");
        assert_eq!(ForeignValue::Other("str".into()).type_name(), "str");
    }

    #[test]
    fn foreign_error_display() {
        let err = ForeignError::new("IOError", "disk gone");
        assert_eq!(err.to_string(), "IOError: disk gone");
    }
}
