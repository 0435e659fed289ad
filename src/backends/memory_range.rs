//! Backend over a caller-owned region of memory.

use std::cell::Cell;

use crate::types::resolve_offset;
use crate::{AccessFlags, Error, IoBackend, Whence};

/// The borrowed bytes behind a [`MemoryRange`].
///
/// A writable region is viewed as a slice of cells, so clones can share it
/// without copying while still allowing writes through any of them.
#[derive(Debug, Clone, Copy)]
enum Region<'a> {
    ReadOnly(&'a [u8]),
    Writable(&'a [Cell<u8>]),
}

impl Region<'_> {
    fn len(&self) -> usize {
        match self {
            Region::ReadOnly(bytes) => bytes.len(),
            Region::Writable(cells) => cells.len(),
        }
    }
}

/// A fixed-length range of borrowed memory.
///
/// The range never copies, grows or frees the memory; the caller keeps it
/// alive for as long as the backend (and every clone) exists, which the
/// lifetime `'a` enforces. Reads and writes stop at the end of the range.
///
/// Seeking past the end is allowed; the next read returns zero bytes and the
/// next write accepts zero bytes.
#[derive(Debug)]
pub struct MemoryRange<'a> {
    region: Region<'a>,
    cursor: u64,
    open: bool,
}

impl<'a> MemoryRange<'a> {
    /// A read-only range over `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_region(Region::ReadOnly(bytes))
    }

    /// A writable range over `bytes`.
    ///
    /// The mutable borrow is held for `'a`, so the caller cannot observe the
    /// memory while any handle over it is alive.
    pub fn new_mut(bytes: &'a mut [u8]) -> Self {
        Self::with_region(Region::Writable(Cell::from_mut(bytes).as_slice_of_cells()))
    }

    fn with_region(region: Region<'a>) -> Self {
        Self {
            region,
            cursor: 0,
            open: false,
        }
    }

    /// Length of the range in bytes.
    pub fn len(&self) -> usize {
        self.region.len()
    }

    /// Returns `true` for a zero-length range.
    pub fn is_empty(&self) -> bool {
        self.region.len() == 0
    }

    /// Returns `true` if the range accepts writes.
    pub fn is_writable(&self) -> bool {
        matches!(self.region, Region::Writable(_))
    }

    /// The readable window starting at the cursor, empty past the end.
    fn remaining(&self) -> std::ops::Range<usize> {
        let len = self.region.len();
        let start = usize::try_from(self.cursor).map_or(len, |c| c.min(len));
        start..len
    }
}

impl IoBackend for MemoryRange<'_> {
    fn open(&mut self, flags: AccessFlags) -> Result<(), Error> {
        if flags.is_write() && !self.is_writable() {
            return Err(Error::unavailable(
                "open",
                "memory range was provided read-only",
            ));
        }
        self.cursor = 0;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.open = false;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let window = self.remaining();
        let count = buf.len().min(window.len());
        let source = window.start..window.start + count;
        match self.region {
            Region::ReadOnly(bytes) => buf[..count].copy_from_slice(&bytes[source]),
            Region::Writable(cells) => {
                for (dst, cell) in buf[..count].iter_mut().zip(&cells[source]) {
                    *dst = cell.get();
                }
            }
        }
        self.cursor += count as u64;
        Ok(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        let Region::Writable(cells) = self.region else {
            return Err(Error::unavailable("write", "memory range is read-only"));
        };
        let window = self.remaining();
        let count = data.len().min(window.len());
        for (cell, byte) in cells[window.start..window.start + count].iter().zip(data) {
            cell.set(*byte);
        }
        self.cursor += count as u64;
        Ok(count)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, Error> {
        let target = resolve_offset(offset, whence, self.cursor, self.region.len() as u64)
            .ok_or(Error::InvalidSeek { offset, whence })?;
        self.cursor = target;
        Ok(target)
    }

    fn offset(&mut self) -> Result<u64, Error> {
        Ok(self.cursor)
    }

    fn size(&mut self) -> Result<u64, Error> {
        Ok(self.region.len() as u64)
    }

    fn exists(&self) -> Result<bool, Error> {
        Ok(true)
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn describe(&self) -> String {
        let access = if self.is_writable() { "writable" } else { "read-only" };
        format!("{access} memory range of {} bytes", self.region.len())
    }

    fn try_clone(&self) -> Result<Self, Error> {
        Ok(Self {
            region: self.region,
            cursor: 0,
            open: self.open,
        })
    }
}
