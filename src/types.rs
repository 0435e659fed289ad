//! Core types for the handle abstraction.

use std::fmt;

/// Access flags passed to [`Handle::open`](crate::Handle::open).
///
/// Stored as a bitmask. Only [`READ`](Self::READ), [`WRITE`](Self::WRITE)
/// and [`TRUNCATE`](Self::TRUNCATE) are defined; any other bit makes the
/// value invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessFlags(u8);

impl AccessFlags {
    /// Open for reading.
    pub const READ: Self = Self(0x01);

    /// Open for writing.
    pub const WRITE: Self = Self(0x02);

    /// Read and write access.
    pub const READ_WRITE: Self = Self(0x03);

    /// Truncate the resource on open. Requires [`WRITE`](Self::WRITE).
    pub const TRUNCATE: Self = Self(0x04);

    const KNOWN: u8 = 0x07;

    /// No access at all. Never valid for `open`.
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build flags from raw bits, keeping unknown bits so validation can reject them.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get the raw bit value.
    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns `true` if read access is requested.
    #[inline]
    pub const fn is_read(&self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns `true` if write access is requested.
    #[inline]
    pub const fn is_write(&self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Returns `true` if truncation is requested.
    #[inline]
    pub const fn is_truncate(&self) -> bool {
        self.contains(Self::TRUNCATE)
    }

    /// Returns `true` if the flags can be passed to `open`.
    ///
    /// Invalid combinations: no direction at all, unknown bits, or
    /// `TRUNCATE` without `WRITE`.
    pub const fn is_valid(&self) -> bool {
        if self.0 & !Self::KNOWN != 0 {
            return false;
        }
        if !self.is_read() && !self.is_write() {
            return false;
        }
        !(self.is_truncate() && !self.is_write())
    }

    /// The same flags without `TRUNCATE`, used when reopening a resource.
    #[inline]
    pub const fn without_truncate(&self) -> Self {
        Self(self.0 & !Self::TRUNCATE.0)
    }
}

impl std::ops::BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.is_read() {
            parts.push("read");
        }
        if self.is_write() {
            parts.push("write");
        }
        if self.is_truncate() {
            parts.push("truncate");
        }
        if parts.is_empty() {
            write!(f, "none")?;
        } else {
            write!(f, "{}", parts.join("|"))?;
        }
        if self.0 & !Self::KNOWN != 0 {
            write!(f, " (unknown bits {:#04x})", self.0 & !Self::KNOWN)?;
        }
        Ok(())
    }
}

/// Reference point for [`Handle::seek`](crate::Handle::seek).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Whence {
    /// Offset is relative to the start of the resource.
    Start,
    /// Offset is relative to the current position.
    Current,
    /// Offset is relative to the end of the resource.
    End,
}

impl fmt::Display for Whence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Whence::Start => "start",
            Whence::Current => "current",
            Whence::End => "end",
        };
        f.write_str(name)
    }
}

/// Convert an offset relative to `whence` into a `std::io::SeekFrom`.
///
/// Returns `None` for a negative offset from the start.
pub(crate) fn to_seek_from(offset: i64, whence: Whence) -> Option<std::io::SeekFrom> {
    match whence {
        Whence::Start => u64::try_from(offset).ok().map(std::io::SeekFrom::Start),
        Whence::Current => Some(std::io::SeekFrom::Current(offset)),
        Whence::End => Some(std::io::SeekFrom::End(offset)),
    }
}

/// Resolve `offset` against `whence` given the current position and size.
///
/// Returns `None` when the result would be negative or overflow.
pub(crate) fn resolve_offset(offset: i64, whence: Whence, current: u64, size: u64) -> Option<u64> {
    let base = match whence {
        Whence::Start => 0,
        Whence::Current => current,
        Whence::End => size,
    };
    base.checked_add_signed(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_flags_constants() {
        assert!(AccessFlags::READ.is_read());
        assert!(!AccessFlags::READ.is_write());

        assert!(AccessFlags::WRITE.is_write());
        assert!(!AccessFlags::WRITE.is_read());

        assert!(AccessFlags::READ_WRITE.is_read());
        assert!(AccessFlags::READ_WRITE.is_write());
        assert_eq!(AccessFlags::READ | AccessFlags::WRITE, AccessFlags::READ_WRITE);
    }

    #[test]
    fn access_flags_validity() {
        assert!(AccessFlags::READ.is_valid());
        assert!(AccessFlags::WRITE.is_valid());
        assert!(AccessFlags::READ_WRITE.is_valid());
        assert!((AccessFlags::WRITE | AccessFlags::TRUNCATE).is_valid());

        assert!(!AccessFlags::empty().is_valid());
        assert!(!AccessFlags::TRUNCATE.is_valid());
        assert!(!(AccessFlags::READ | AccessFlags::TRUNCATE).is_valid());
        assert!(!AccessFlags::from_bits(0x81).is_valid());
    }

    #[test]
    fn access_flags_without_truncate() {
        let flags = AccessFlags::READ_WRITE | AccessFlags::TRUNCATE;
        assert_eq!(flags.without_truncate(), AccessFlags::READ_WRITE);
    }

    #[test]
    fn access_flags_display() {
        assert_eq!(AccessFlags::READ_WRITE.to_string(), "read|write");
        assert_eq!(AccessFlags::empty().to_string(), "none");
        assert!(AccessFlags::from_bits(0x11).to_string().contains("unknown"));
    }

    #[test]
    fn resolve_offset_rejects_negative() {
        assert_eq!(resolve_offset(-1, Whence::Start, 0, 10), None);
        assert_eq!(resolve_offset(-11, Whence::End, 0, 10), None);
        assert_eq!(resolve_offset(-5, Whence::Current, 4, 10), None);
    }

    #[test]
    fn resolve_offset_allows_past_end() {
        assert_eq!(resolve_offset(5, Whence::End, 0, 10), Some(15));
        assert_eq!(resolve_offset(-3, Whence::Current, 4, 10), Some(1));
        assert_eq!(resolve_offset(100, Whence::Start, 4, 10), Some(100));
    }

    #[test]
    fn to_seek_from_maps_whence() {
        assert_eq!(to_seek_from(3, Whence::Start), Some(std::io::SeekFrom::Start(3)));
        assert_eq!(to_seek_from(-3, Whence::Start), None);
        assert_eq!(to_seek_from(-3, Whence::End), Some(std::io::SeekFrom::End(-3)));
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AccessFlags>();
        assert_send_sync::<Whence>();
    }
}
