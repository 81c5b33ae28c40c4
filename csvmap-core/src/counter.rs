use crate::policy::Policy;
use crate::tokenizer::{Boundary, Splitter};

/// Counts the fields in every row.
///
/// The counter replays the field grammar without looking at content. Each
/// field boundary bumps a running count; each row boundary returns that
/// count and starts over.
#[derive(Clone, Debug)]
pub struct ColumnCounter {
    splitter: Splitter,
    count: u64,
}

impl ColumnCounter {
    /// Create a column counter for the given policy.
    pub fn new(policy: &Policy) -> ColumnCounter {
        ColumnCounter { splitter: Splitter::new(policy), count: 0 }
    }

    /// Feed one byte. When it ends a row, the number of fields in that row
    /// is returned.
    #[inline]
    pub fn feed(&mut self, b: u8) -> Option<u64> {
        let boundary = self.splitter.feed(b)?;
        self.bump(boundary)
    }

    /// Signal the end of input. See [`Splitter::finish`].
    pub fn finish(&mut self) -> Option<u64> {
        let boundary = self.splitter.finish()?;
        self.bump(boundary)
    }

    fn bump(&mut self, boundary: Boundary) -> Option<u64> {
        self.count += 1;
        if boundary.is_row() {
            Some(core::mem::replace(&mut self.count, 0))
        } else {
            None
        }
    }
}

/// Counts rows.
#[derive(Clone, Debug)]
pub struct RowCounter {
    splitter: Splitter,
}

impl RowCounter {
    /// Create a row counter for the given policy.
    pub fn new(policy: &Policy) -> RowCounter {
        RowCounter { splitter: Splitter::new(policy) }
    }

    /// Feed one byte. Returns `1` if it ended a row and `0` otherwise, so
    /// the ticks can simply be summed.
    #[inline]
    pub fn feed(&mut self, b: u8) -> u64 {
        self.splitter.feed(b).map_or(0, |bd| bd.is_row() as u64)
    }

    /// Signal the end of input. Returns `1` if a row was still open.
    pub fn finish(&mut self) -> u64 {
        self.splitter.finish().map_or(0, |bd| bd.is_row() as u64)
    }
}

/// An iterator over the number of fields in each row of a byte stream.
///
/// The stream must end with a line terminator, as every stream produced by
/// `csvmap`'s feeder does.
#[derive(Debug)]
pub struct RowLengths<I> {
    bytes: I,
    counter: ColumnCounter,
    done: bool,
}

impl<I: Iterator<Item = u8>> RowLengths<I> {
    /// Count the fields of each row in `bytes`.
    pub fn new(policy: &Policy, bytes: I) -> RowLengths<I> {
        RowLengths { bytes, counter: ColumnCounter::new(policy), done: false }
    }
}

impl<I: Iterator<Item = u8>> Iterator for RowLengths<I> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        for b in &mut self.bytes {
            if let Some(len) = self.counter.feed(b) {
                return Some(len);
            }
        }
        self.done = true;
        self.counter.finish()
    }
}

impl<I: Iterator<Item = u8>> core::iter::FusedIterator for RowLengths<I> {}
