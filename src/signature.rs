//! Leading-block signature detection through a [`Handle`].
//!
//! A format parser typically asks "is this an executable image?" before
//! committing to a full decode. [`SignatureProbe`] answers that using only the
//! public handle contract: it reads the first block and compares it against a
//! list of known magic sequences.
//!
//! ```rust
//! use anyio_backend::{Handle, Signature, SignatureProbe};
//!
//! let zeros = [0u8; 512];
//! let mut handle = Handle::memory_range(&zeros);
//!
//! let probe = SignatureProbe::new(&[Signature::EXE_MZ]);
//! assert!(!probe.matches(&mut handle)?);
//! assert!(!handle.is_open());
//! # Ok::<(), anyio_backend::Error>(())
//! ```

use log::debug;

use crate::{AccessFlags, Error, Handle, IoBackend};

/// Default number of leading bytes inspected.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// A magic byte sequence expected at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Human-readable name of the format.
    pub name: &'static str,
    /// Offset of the magic from the start of the resource.
    pub offset: usize,
    /// The expected bytes.
    pub magic: &'static [u8],
}

impl Signature {
    /// DOS/PE executable image (`MZ` at offset 0).
    pub const EXE_MZ: Signature = Signature::new("MZ executable", 0, b"MZ");

    /// Create a signature.
    pub const fn new(name: &'static str, offset: usize, magic: &'static [u8]) -> Self {
        Self {
            name,
            offset,
            magic,
        }
    }

    fn matches(&self, block: &[u8]) -> bool {
        let end = self.offset + self.magic.len();
        block.get(self.offset..end) == Some(self.magic)
    }
}

/// Matches the leading block of a handle against known signatures.
#[derive(Debug, Clone)]
pub struct SignatureProbe<'s> {
    signatures: &'s [Signature],
    block_size: usize,
}

impl<'s> SignatureProbe<'s> {
    /// A probe over `signatures`, reading [`DEFAULT_BLOCK_SIZE`] bytes.
    pub fn new(signatures: &'s [Signature]) -> Self {
        Self {
            signatures,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Change how many leading bytes are read.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// The first signature found in the leading block, if any.
    ///
    /// A closed handle is opened read-only for the probe and closed again.
    /// An open handle keeps its state and has its offset restored. A resource
    /// shorter than a signature simply does not match it.
    ///
    /// # Errors
    ///
    /// Whatever the handle reports while opening, reading, seeking or
    /// closing. On a read failure the handle is still closed (or its offset
    /// restored) before the error is returned.
    pub fn probe<B: IoBackend>(
        &self,
        handle: &mut Handle<B>,
    ) -> Result<Option<&'s Signature>, Error> {
        let block = if handle.is_open() {
            let original = handle.offset()?;
            let block = self.read_block(handle);
            let restored = i64::try_from(original)
                .map_err(|_| Error::unavailable("probe", "offset out of range"))
                .and_then(|pos| handle.seek(pos, crate::Whence::Start));
            let block = block?;
            restored?;
            block
        } else {
            handle.open(AccessFlags::READ)?;
            let block = self.read_block(handle);
            let closed = handle.close();
            let block = block?;
            closed?;
            block
        };

        let found = self.signatures.iter().find(|sig| sig.matches(&block));
        debug!(
            "probed {} leading bytes: {}",
            block.len(),
            found.map_or("no match", |sig| sig.name)
        );
        Ok(found)
    }

    /// Whether any signature matches.
    pub fn matches<B: IoBackend>(&self, handle: &mut Handle<B>) -> Result<bool, Error> {
        Ok(self.probe(handle)?.is_some())
    }

    fn read_block<B: IoBackend>(&self, handle: &mut Handle<B>) -> Result<Vec<u8>, Error> {
        let mut block = vec![0u8; self.block_size];
        let mut filled = handle.read_at(&mut block, 0)?;
        while filled < block.len() {
            let count = handle.read(&mut block[filled..])?;
            if count == 0 {
                break;
            }
            filled += count;
        }
        block.truncate(filled);
        Ok(block)
    }
}
