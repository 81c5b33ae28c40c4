use std::fmt;
use std::fs::File;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::slice;

use csvmap_core::LF;
use memmap2::Mmap;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// An immutable, contiguous range of bytes to read CSV data from.
///
/// A reader owns exactly one source for its whole life. Sources expose no way
/// to mutate their bytes, so spans handed out by a reader always point at the
/// same data.
///
/// Two implementations are provided: [`BufferSource`] owns an in-memory
/// buffer, and [`MmapSource`] maps a file read-only. Only
/// [`as_bytes`](Source::as_bytes) is required; everything else is derived
/// from it.
pub trait Source: fmt::Debug + Send + Sync {
    /// All of the bytes in this source.
    fn as_bytes(&self) -> &[u8];

    /// The number of bytes in this source.
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if this source has no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The byte at offset `i`, if there is one.
    fn get(&self, i: usize) -> Option<u8> {
        self.as_bytes().get(i).copied()
    }

    /// The last byte, if there is one.
    fn last(&self) -> Option<u8> {
        self.as_bytes().last().copied()
    }

    /// A fresh single pass over this source's bytes. See [`Feeder`].
    fn feed(&self) -> Feeder<'_> {
        Feeder::new(self.as_bytes())
    }
}

/// A source that owns an in-memory buffer.
pub struct BufferSource {
    buf: Box<[u8]>,
}

impl BufferSource {
    /// Take ownership of `buf`.
    pub fn new<B: Into<Vec<u8>>>(buf: B) -> BufferSource {
        BufferSource { buf: buf.into().into_boxed_slice() }
    }
}

impl Source for BufferSource {
    fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl fmt::Debug for BufferSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BufferSource").field("len", &self.buf.len()).finish()
    }
}

/// A source backed by a read-only memory map of a file.
#[derive(Debug)]
pub struct MmapSource {
    path: PathBuf,
    map: Mmap,
}

impl MmapSource {
    /// Map the file at `path`.
    ///
    /// This fails if the file cannot be opened or mapped, or if it is empty.
    /// Empty files are rejected before mapping is attempted.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<MmapSource> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::io(path, err))?;
        let len = file.metadata().map_err(|err| Error::io(path, err))?.len();
        if len == 0 {
            return Err(Error::new(ErrorKind::Empty {
                path: Some(path.to_path_buf()),
            }));
        }
        // SAFETY: the map is read-only and never handed out mutably. As with
        // any file map, truncating the file from another process while it is
        // mapped is outside of what this crate can guard against.
        let map =
            unsafe { Mmap::map(&file) }.map_err(|err| Error::io(path, err))?;
        debug!(path = %path.display(), len = map.len(), "mapped CSV source");
        Ok(MmapSource { path: path.to_path_buf(), map })
    }

    /// The path this source was mapped from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for MmapSource {
    fn as_bytes(&self) -> &[u8] {
        &self.map
    }
}

/// A single pass over the bytes of a source.
///
/// The feeder yields every byte in order and then, if the source does not
/// already end with a line terminator, one synthesized `\n`. Every stream fed
/// to a tokenizer therefore ends with exactly one terminator, and no field is
/// left open at the end of input unless it is inside an unclosed quote.
///
/// An empty input yields nothing at all. Feeders cannot be rewound; build a
/// new one for each traversal.
#[derive(Debug)]
pub struct Feeder<'s> {
    bytes: slice::Iter<'s, u8>,
    tail: Option<u8>,
}

impl<'s> Feeder<'s> {
    /// Create a feeder over `bytes`.
    pub fn new(bytes: &'s [u8]) -> Feeder<'s> {
        let tail = match bytes.last() {
            None | Some(&LF) => None,
            Some(_) => Some(LF),
        };
        Feeder { bytes: bytes.iter(), tail }
    }
}

impl<'s> Iterator for Feeder<'s> {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        match self.bytes.next() {
            Some(&b) => Some(b),
            None => self.tail.take(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bytes.len() + self.tail.is_some() as usize;
        (n, Some(n))
    }
}

impl<'s> ExactSizeIterator for Feeder<'s> {}

impl<'s> FusedIterator for Feeder<'s> {}
