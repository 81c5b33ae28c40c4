use std::fmt;
use std::ops::Range;

use bstr::ByteSlice;
use csvmap_core::{field, Policy, Span};

/// A zero-copy view of one field in a reader's source.
///
/// A cell is an offset pair plus borrowed handles to the source bytes and the
/// reader's policy. Nothing is copied or unescaped until
/// [`read_value`](Cell::read_value) is called.
///
/// Cells borrow the reader that produced them, so a cell can never outlive
/// its source. Moving, dropping or detaching the reader while a cell is
/// alive does not compile:
///
/// ```compile_fail
/// use csvmap::{Cell, Reader};
///
/// let mut rdr = Reader::from_bytes("a,b\n").unwrap();
/// let mut cells: Vec<Cell> = vec![];
/// rdr.run_span(|cell| cells.push(cell)).unwrap();
/// let moved = rdr.take();
/// println!("{:?}", cells[0].to_vec());
/// ```
#[derive(Clone, Copy)]
pub struct Cell<'r> {
    src: &'r [u8],
    policy: &'r Policy,
    span: Span,
}

impl<'r> Cell<'r> {
    pub(crate) fn new(src: &'r [u8], policy: &'r Policy, span: Span) -> Cell<'r> {
        debug_assert!(
            span.end <= src.len(),
            "span {:?} outside of a source with {} bytes",
            span,
            src.len()
        );
        Cell { src, policy, span }
    }

    /// The offsets of this cell's raw bytes in the source.
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }

    /// The raw bytes of this cell, quotes and padding included.
    pub fn raw(&self) -> &'r [u8] {
        &self.src[self.span.range()]
    }

    /// Returns true if this cell has no raw bytes at all.
    ///
    /// A cell with raw bytes can still read back as an empty value, for
    /// example `""` or a blank cell under a trimming policy.
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// Unescape this cell into `dst`.
    ///
    /// `dst` is cleared first. The value is identical to what the
    /// materializing traversal hands to its callbacks for the same field:
    /// doubled quotes are collapsed, a wrapping quote pair is removed and the
    /// trim policy is applied. Calling this any number of times yields the
    /// same bytes.
    pub fn read_value(&self, dst: &mut Vec<u8>) {
        field::unescape(self.raw(), self.policy, dst);
    }

    /// Unescape this cell into a new buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut dst = Vec::with_capacity(self.span.len());
        self.read_value(&mut dst);
        dst
    }
}

impl<'r> fmt::Debug for Cell<'r> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cell")
            .field("range", &self.range())
            .field("raw", &self.raw().as_bstr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use csvmap_core::{Policy, Span, Trim};

    use super::Cell;

    #[test]
    fn raw_and_value() {
        let src = br#"x," a ""b"" ",y"#;
        let policy = Policy::default();
        let cell = Cell::new(src, &policy, Span { start: 2, end: 13 });
        assert_eq!(cell.raw(), br#"" a ""b"" ""#);
        assert_eq!(cell.to_vec(), br#" a "b" "#);
        assert!(!cell.is_empty());
    }

    #[test]
    fn read_value_is_idempotent() {
        let src = b" padded ";
        let policy = Policy { trim: Trim::Whitespace, ..Policy::default() };
        let cell = Cell::new(src, &policy, Span { start: 0, end: 8 });
        let mut dst = b"stale".to_vec();
        cell.read_value(&mut dst);
        assert_eq!(dst, b"padded");
        cell.read_value(&mut dst);
        assert_eq!(dst, b"padded");
    }

    #[test]
    fn empty_cell() {
        let src = b"a,,b";
        let policy = Policy::default();
        let cell = Cell::new(src, &policy, Span { start: 2, end: 2 });
        assert!(cell.is_empty());
        assert!(cell.to_vec().is_empty());
    }

    #[test]
    fn debug_shows_raw_bytes() {
        let src = b"abc";
        let policy = Policy::default();
        let cell = Cell::new(src, &policy, Span { start: 1, end: 3 });
        assert_eq!(format!("{:?}", cell), r#"Cell { range: 1..3, raw: "bc" }"#);
    }
}
