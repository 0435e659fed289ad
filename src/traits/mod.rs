//! # Capability Traits
//!
//! The seams of the abstraction.
//!
//! | Trait | Implemented by | Purpose |
//! |-------|----------------|---------|
//! | [`IoBackend`] | [`NativeFile`](crate::NativeFile), [`MemoryRange`](crate::MemoryRange), [`ForeignStream`](crate::ForeignStream) | Per-medium open/close/read/write/seek/size |
//! | [`ForeignObject`] | Host bindings | File-like object owned by a host environment |
//!
//! A [`Handle`](crate::Handle) owns exactly one `IoBackend`, chosen when the
//! handle is constructed. `ForeignObject` sits one level further down: it is
//! what the [`ForeignStream`](crate::ForeignStream) backend adapts.

mod foreign_object;
mod io_backend;

pub use foreign_object::{ForeignError, ForeignMethod, ForeignObject, ForeignValue};
pub use io_backend::IoBackend;
