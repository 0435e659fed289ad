//! # anyio-backend
//!
//! Pluggable random-access binary I/O for format parsers.
//!
//! Parsers that decode executable images, archives or disk images need to read
//! and seek over bytes without caring where those bytes live. This crate gives
//! them one [`Handle`] type with one contract, backed by one of three media:
//!
//! - [`NativeFile`]: a file on disk, addressed by path
//! - [`MemoryRange`]: caller-owned memory, borrowed for the handle's lifetime
//! - [`ForeignStream`]: a file-like object owned by a host environment
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use anyio_backend::{AccessFlags, Error, Handle, IoBackend};
//!
//! // Generic function that works with any backend
//! fn read_header<B: IoBackend>(handle: &mut Handle<B>) -> Result<[u8; 4], Error> {
//!     let mut header = [0u8; 4];
//!     handle.open(AccessFlags::READ)?;
//!     let result = handle.read_exact_at(&mut header, 0);
//!     handle.close()?;
//!     result.map(|()| header)
//! }
//!
//! let image = b"MZ\x90\x00rest of the image";
//! let mut handle = Handle::memory_range(image);
//! assert_eq!(&read_header(&mut handle)?, b"MZ\x90\x00");
//! # Ok::<(), Error>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Handle`] | Backend-agnostic open/read/write/seek/size/clone/close |
//! | [`IoBackend`] | Capability set each medium implements |
//! | [`ForeignObject`] | Contract for host-owned stream objects |
//! | [`AccessFlags`] | `READ`, `WRITE`, `READ_WRITE`, plus `TRUNCATE` |
//! | [`Error`] | Contextual error with chained causes |
//! | [`ErrorKind`] | Closed taxonomy of failure kinds |
//! | [`ErrorStack`] | Ordered collection of errors across calls |
//! | [`SignatureProbe`] | Leading-block magic detection through a handle |
//!
//! ---
//!
//! ## Lifecycle
//!
//! Every successful `open` must be matched by exactly one `close`. `close`
//! always leaves the handle closed, even when backend teardown reports an
//! error. Dropping an open handle closes it as a last resort and logs a
//! warning.
//!
//! ## Cloning
//!
//! [`Handle::try_clone`] gives an independent handle whose offset starts at
//! zero:
//!
//! - native files reopen the path with a fresh descriptor
//! - memory ranges share the same borrowed bytes without copying
//! - foreign streams share the host object, *including its position*
//!
//! ---
//!
//! ## Error Handling
//!
//! Every fallible operation returns `Result<T, Error>`. Lower-level causes are
//! kept in the source chain:
//!
//! ```rust
//! use anyio_backend::{AccessFlags, ErrorKind, Handle};
//!
//! let mut handle = Handle::native_file("/definitely/not/here.exe");
//! let err = handle.open(AccessFlags::READ).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
//! assert!(err.causes().next().is_some());
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! A handle performs no locking. Give each thread its own clone. Clones of a
//! foreign stream alias one host object, so any synchronisation it needs is
//! the host's responsibility.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`AccessFlags`], [`Whence`], [`ErrorKind`]; enables `ErrorStack::to_json` |
//!
//! ## Logging
//!
//! Lifecycle events are emitted through the [`log`] facade: `debug` for
//! open/close/clone, `trace` for individual transfers and seeks, `warn` for
//! teardown failures and handles dropped while open.

// Private modules
mod backends;
mod error;
mod error_stack;
mod handle;
mod signature;
mod traits;
mod types;

// Public re-exports - error types
pub use error::{BoxError, Error, ErrorKind};
pub use error_stack::ErrorStack;

// Public re-exports - core types
pub use types::{AccessFlags, Whence};

// Public re-exports - traits
pub use traits::{ForeignError, ForeignMethod, ForeignObject, ForeignValue, IoBackend};

// Public re-exports - backends
pub use backends::{ForeignStream, MemoryRange, NativeFile};

// Public re-exports - handle and consumers
pub use handle::Handle;
pub use signature::{DEFAULT_BLOCK_SIZE, Signature, SignatureProbe};
