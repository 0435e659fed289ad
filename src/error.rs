//! Error types for the handle abstraction.

use std::path::PathBuf;

use crate::{AccessFlags, Whence};

/// Boxed lower-level cause kept in an error's source chain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The closed taxonomy of failure kinds.
///
/// Every [`Error`] maps to exactly one kind via [`Error::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// `open` called on a handle that is already open.
    AlreadyOpen,
    /// Operation requires an open handle.
    NotOpen,
    /// Access flags are empty or combine incompatible bits.
    InvalidAccessFlags,
    /// Handle was not opened for reading.
    NotReadable,
    /// Handle was not opened for writing.
    NotWritable,
    /// Seek would land on a negative offset.
    InvalidSeek,
    /// Fewer bytes were written than requested, before end of resource.
    PartialWrite,
    /// Cloning the handle failed.
    CloneFailed,
    /// A foreign stream broke its contract or raised an error.
    ForeignProtocolViolation,
    /// The underlying resource is missing, unreachable or unusable.
    ResourceUnavailable,
}

impl ErrorKind {
    /// Short stable name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyOpen => "already open",
            ErrorKind::NotOpen => "not open",
            ErrorKind::InvalidAccessFlags => "invalid access flags",
            ErrorKind::NotReadable => "not readable",
            ErrorKind::NotWritable => "not writable",
            ErrorKind::InvalidSeek => "invalid seek",
            ErrorKind::PartialWrite => "partial write",
            ErrorKind::CloneFailed => "clone failed",
            ErrorKind::ForeignProtocolViolation => "foreign protocol violation",
            ErrorKind::ResourceUnavailable => "resource unavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle error type with contextual variants.
///
/// Lower-level causes are kept in the source chain rather than flattened
/// into the message. Use [`Error::causes`] to walk them.
///
/// # Examples
///
/// ```rust
/// use anyio_backend::{Error, ErrorKind};
///
/// let err = Error::NotOpen { operation: "read" };
/// assert_eq!(err.kind(), ErrorKind::NotOpen);
/// assert_eq!(err.to_string(), "read: handle is not open");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Handle is already open.
    #[error("open: handle is already open")]
    AlreadyOpen,

    /// Handle is not open.
    #[error("{operation}: handle is not open")]
    NotOpen {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// Access flags are not a valid combination.
    #[error("invalid access flags: {flags}")]
    InvalidAccessFlags {
        /// The rejected flags.
        flags: AccessFlags,
    },

    /// Handle was opened without read access.
    #[error("read: handle was opened without read access ({flags})")]
    NotReadable {
        /// The flags the handle was opened with.
        flags: AccessFlags,
    },

    /// Handle was opened without write access.
    #[error("write: handle was opened without write access ({flags})")]
    NotWritable {
        /// The flags the handle was opened with.
        flags: AccessFlags,
    },

    /// Seek target is negative.
    #[error("invalid seek: offset {offset} from {whence}")]
    InvalidSeek {
        /// The requested offset.
        offset: i64,
        /// The reference point.
        whence: Whence,
    },

    /// Absolute seek target does not fit a signed offset.
    #[error("invalid seek: offset {target} from start is out of range")]
    SeekOutOfRange {
        /// The requested absolute offset.
        target: u64,
    },

    /// Short write before end of resource.
    #[error("partial write: {written} of {requested} bytes written")]
    PartialWrite {
        /// Bytes the caller asked to write.
        requested: usize,
        /// Bytes actually accepted.
        written: usize,
        /// Cause reported by the backend, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// Clone of a handle could not be completed.
    #[error("clone failed: {resource}")]
    CloneFailed {
        /// Description of the resource being cloned.
        resource: String,
        /// Why the clone failed.
        #[source]
        source: Box<Error>,
    },

    /// Foreign stream broke its contract or raised an error.
    #[error("{operation}: foreign protocol violation: {details}")]
    ForeignProtocolViolation {
        /// The foreign call that failed.
        operation: &'static str,
        /// What went wrong.
        details: String,
        /// The error raised by the foreign side, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// Native file cannot be reached.
    #[error("{operation} failed for {path}: {source}")]
    FileUnavailable {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Any other backend resource is missing or unusable.
    #[error("{operation}: resource unavailable: {details}")]
    ResourceUnavailable {
        /// The operation that failed.
        operation: &'static str,
        /// What is missing or unusable.
        details: String,
    },
}

impl Error {
    /// The taxonomy tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyOpen => ErrorKind::AlreadyOpen,
            Error::NotOpen { .. } => ErrorKind::NotOpen,
            Error::InvalidAccessFlags { .. } => ErrorKind::InvalidAccessFlags,
            Error::NotReadable { .. } => ErrorKind::NotReadable,
            Error::NotWritable { .. } => ErrorKind::NotWritable,
            Error::InvalidSeek { .. } | Error::SeekOutOfRange { .. } => ErrorKind::InvalidSeek,
            Error::PartialWrite { .. } => ErrorKind::PartialWrite,
            Error::CloneFailed { .. } => ErrorKind::CloneFailed,
            Error::ForeignProtocolViolation { .. } => ErrorKind::ForeignProtocolViolation,
            Error::FileUnavailable { .. } | Error::ResourceUnavailable { .. } => {
                ErrorKind::ResourceUnavailable
            }
        }
    }

    /// Iterate over the chained causes of this error, nearest first.
    ///
    /// The error itself is not included.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn std::error::Error + 'static)> {
        std::iter::successors(std::error::Error::source(self), |cause| cause.source())
    }

    pub(crate) fn foreign(operation: &'static str, details: impl Into<String>) -> Self {
        Error::ForeignProtocolViolation {
            operation,
            details: details.into(),
            source: None,
        }
    }

    pub(crate) fn unavailable(operation: &'static str, details: impl Into<String>) -> Self {
        Error::ResourceUnavailable {
            operation,
            details: details.into(),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        let kind = match error.kind() {
            ErrorKind::NotOpen
            | ErrorKind::AlreadyOpen
            | ErrorKind::InvalidAccessFlags
            | ErrorKind::InvalidSeek => std::io::ErrorKind::InvalidInput,
            ErrorKind::NotReadable | ErrorKind::NotWritable => {
                std::io::ErrorKind::PermissionDenied
            }
            ErrorKind::PartialWrite => std::io::ErrorKind::WriteZero,
            ErrorKind::ForeignProtocolViolation => std::io::ErrorKind::InvalidData,
            ErrorKind::CloneFailed | ErrorKind::ResourceUnavailable => match &error {
                Error::FileUnavailable { source, .. } => source.kind(),
                _ => std::io::ErrorKind::Other,
            },
        };
        std::io::Error::new(kind, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_open_display() {
        let err = Error::NotOpen { operation: "seek" };
        assert_eq!(err.to_string(), "seek: handle is not open");
        assert_eq!(err.kind(), ErrorKind::NotOpen);
    }

    #[test]
    fn partial_write_display() {
        let err = Error::PartialWrite {
            requested: 10,
            written: 4,
            source: None,
        };
        assert_eq!(err.to_string(), "partial write: 4 of 10 bytes written");
    }

    #[test]
    fn invalid_seek_display() {
        let err = Error::InvalidSeek {
            offset: -4,
            whence: Whence::Current,
        };
        assert_eq!(err.to_string(), "invalid seek: offset -4 from current");
    }

    #[test]
    fn seek_out_of_range_keeps_target() {
        let err = Error::SeekOutOfRange { target: u64::MAX };
        assert_eq!(err.kind(), ErrorKind::InvalidSeek);
        assert!(err.to_string().contains(&u64::MAX.to_string()));
    }

    #[test]
    fn file_unavailable_is_resource_unavailable() {
        let err = Error::FileUnavailable {
            operation: "open",
            path: PathBuf::from("/missing.bin"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
        assert!(err.to_string().contains("/missing.bin"));
    }

    #[test]
    fn causes_walk_the_source_chain() {
        let inner = Error::FileUnavailable {
            operation: "open",
            path: PathBuf::from("/data.bin"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let err = Error::CloneFailed {
            resource: "/data.bin".into(),
            source: Box::new(inner),
        };
        let causes: Vec<String> = err.causes().map(|c| c.to_string()).collect();
        assert_eq!(causes.len(), 2);
        assert!(causes[0].starts_with("open failed for /data.bin"));
        assert_eq!(causes[1], "no such file");
    }

    #[test]
    fn into_io_error_keeps_file_kind() {
        let err = Error::FileUnavailable {
            operation: "open",
            path: PathBuf::from("/x"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let io: std::io::Error = err.into();
        assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn into_io_error_maps_access_kinds() {
        let io: std::io::Error = Error::NotReadable {
            flags: AccessFlags::WRITE,
        }
        .into();
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<ErrorKind>();
    }
}
