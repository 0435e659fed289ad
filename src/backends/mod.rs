//! # Backends
//!
//! The three media a [`Handle`](crate::Handle) can sit on.
//!
//! | Backend | Owns | Clone |
//! |---------|------|-------|
//! | [`NativeFile`] | The path; the OS descriptor while open | Reopens the path with an independent descriptor |
//! | [`MemoryRange`] | Nothing; borrows caller memory for `'a` | Shares the same borrowed bytes, cursor reset to 0 |
//! | [`ForeignStream`] | One shared reference to the host object | Takes another reference; clones alias one object |

mod foreign_stream;
mod memory_range;
mod native_file;

pub use foreign_stream::ForeignStream;
pub use memory_range::MemoryRange;
pub use native_file::NativeFile;
