use std::ffi::CStr;
use std::path::Path;

use bstr::{BStr, ByteSlice};
use csvmap_core::{
    Boundary, Policy, RowCounter, RowLengths, Span, SpanTokenizer, Tokenizer,
    Trim,
};
use tracing::{debug, trace};

use crate::cell::Cell;
use crate::dispatch::{
    ignore_cell, ignore_field, ignore_row, Callbacks, Handler, Router, Slot,
    SpanHandler,
};
use crate::error::{Error, ErrorKind, Result};
use crate::source::{BufferSource, Feeder, MmapSource, Source};

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, quote character
/// and trimming policy. Once a `Reader` is built, its policy cannot be
/// changed.
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    policy: Policy,
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV reader over a memory map of the file at `path`.
    ///
    /// # Errors
    ///
    /// This returns an error if the file cannot be opened or mapped, or if
    /// it is empty.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader> {
        self.from_source(Box::new(MmapSource::open(path)?))
    }

    /// Build a CSV reader that takes ownership of an in-memory buffer.
    ///
    /// Anything that converts into a `Vec<u8>` is accepted, including
    /// `String` and `&str`.
    ///
    /// # Errors
    ///
    /// This returns an error if the buffer is empty.
    pub fn from_bytes<B: Into<Vec<u8>>>(&self, bytes: B) -> Result<Reader> {
        let src = BufferSource::new(bytes);
        debug!(len = src.len(), "buffered CSV source");
        self.from_source(Box::new(src))
    }

    /// Build a CSV reader from a C string, without its nul terminator.
    ///
    /// This copies the string into a buffer, exactly like `from_bytes`.
    pub fn from_c_str(&self, s: &CStr) -> Result<Reader> {
        self.from_bytes(s.to_bytes())
    }

    /// Build a CSV reader over an arbitrary byte source.
    ///
    /// # Errors
    ///
    /// This returns an error if the source is empty.
    pub fn from_source(&self, src: Box<dyn Source>) -> Result<Reader> {
        if src.is_empty() {
            return Err(Error::new(ErrorKind::Empty { path: None }));
        }
        Ok(Reader { policy: self.policy.clone(), src: Some(src) })
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.policy.delimiter = delimiter;
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.policy.quote = quote;
        self
    }

    /// The trimming policy applied to every field.
    ///
    /// The default is `Trim::None`.
    pub fn trim(&mut self, trim: Trim) -> &mut ReaderBuilder {
        self.policy.trim = trim;
        self
    }

    /// Replace the whole policy at once, for example with one loaded from a
    /// config file.
    pub fn policy(&mut self, policy: Policy) -> &mut ReaderBuilder {
        self.policy = policy;
        self
    }
}

/// The shape of a table: its number of columns and rows.
///
/// The column count is the number of fields in the first row.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    /// The number of fields in the first row.
    pub cols: u64,
    /// The number of rows, the header row included.
    pub rows: u64,
}

/// A CSV reader over a memory-mapped file or an in-memory buffer.
///
/// A reader owns its byte source. Every query (`cols`, `rows`, `shape`,
/// `valid`) and every traversal (`run*`, `dispatch*`) replays the source from
/// the start, so they may be called any number of times, in any order.
///
/// Traversals come in two flavors. Materializing traversals (`run`,
/// `run_rows`, `run_headers`, `dispatch`) hand each field to a callback as a
/// `&BStr` that has already been unescaped and trimmed. Zero-copy traversals
/// (`run_span`, `run_span_rows`, `run_span_headers`, `dispatch_span`) hand
/// out [`Cell`]s instead, which are unescaped only when read. Both flavors
/// produce the same values for the same source and policy.
///
/// # Example
///
/// ```
/// use csvmap::Reader;
///
/// # fn example() -> csvmap::Result<()> {
/// let rdr = Reader::from_bytes("city,pop\nBoston,4628910\nConcord,42695\n")?;
/// assert_eq!(rdr.cols()?, 2);
/// assert_eq!(rdr.rows()?, 3);
///
/// let cols = rdr.cols()?;
/// let (mut total, mut i) = (0u64, 0u64);
/// rdr.valid()?.run_headers(
///     |_| {},
///     |field| {
///         if i % cols == 1 {
///             total += std::str::from_utf8(field).unwrap().parse::<u64>().unwrap();
///         }
///         i += 1;
///     },
///     || {},
/// )?;
/// assert_eq!(total, 4671605);
/// # Ok(()) }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct Reader {
    policy: Policy,
    /// `None` once the source has been moved out with `take`.
    src: Option<Box<dyn Source>>,
}

impl Reader {
    /// Create a reader with a default policy over a memory map of the file
    /// at `path`.
    ///
    /// To customize the policy, use a `ReaderBuilder`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader> {
        ReaderBuilder::new().from_path(path)
    }

    /// Create a reader with a default policy that owns `bytes`.
    ///
    /// To customize the policy, use a `ReaderBuilder`.
    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Result<Reader> {
        ReaderBuilder::new().from_bytes(bytes)
    }

    /// Create a reader with a default policy from a C string.
    pub fn from_c_str(s: &CStr) -> Result<Reader> {
        ReaderBuilder::new().from_c_str(s)
    }

    /// Create a reader with a default policy over an arbitrary source.
    pub fn from_source(src: Box<dyn Source>) -> Result<Reader> {
        ReaderBuilder::new().from_source(src)
    }

    /// The policy this reader applies.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The byte source of this reader.
    pub fn source(&self) -> Result<&dyn Source> {
        self.src.as_deref().ok_or_else(|| Error::new(ErrorKind::Detached))
    }

    /// Returns true if this reader's source has been moved out.
    pub fn is_detached(&self) -> bool {
        self.src.is_none()
    }

    /// Move this reader's source into a new reader with the same policy.
    ///
    /// `self` is left detached: every query and traversal on it returns an
    /// `ErrorKind::Detached` error from then on. It never reports zero rows
    /// or an empty table instead.
    ///
    /// ```
    /// use csvmap::{ErrorKind, Reader};
    ///
    /// let mut old = Reader::from_bytes("a,b\n").unwrap();
    /// let new = old.take();
    /// assert_eq!(new.cols().unwrap(), 2);
    /// assert!(old.is_detached());
    /// match *old.cols().unwrap_err().kind() {
    ///     ErrorKind::Detached => {}
    ///     ref kind => panic!("unexpected error kind: {:?}", kind),
    /// }
    /// ```
    pub fn take(&mut self) -> Reader {
        Reader { policy: self.policy.clone(), src: self.src.take() }
    }

    /// The number of fields in the first row.
    pub fn cols(&self) -> Result<u64> {
        let bytes = self.bytes()?;
        let mut lens = RowLengths::new(&self.policy, Feeder::new(bytes));
        Ok(lens.next().unwrap_or(0))
    }

    /// The number of rows, the header row included.
    ///
    /// A source that holds nothing but whitespace is still one row.
    pub fn rows(&self) -> Result<u64> {
        let bytes = self.bytes()?;
        let mut counter = RowCounter::new(&self.policy);
        let ticks: u64 = Feeder::new(bytes).map(|b| counter.feed(b)).sum();
        Ok(ticks + counter.finish())
    }

    /// The column and row counts, computed in a single pass.
    pub fn shape(&self) -> Result<Shape> {
        let bytes = self.bytes()?;
        let mut shape = Shape::default();
        for len in RowLengths::new(&self.policy, Feeder::new(bytes)) {
            if shape.rows == 0 {
                shape.cols = len;
            }
            shape.rows += 1;
        }
        Ok(shape)
    }

    /// Check that every row has as many fields as the first one.
    ///
    /// The check stops at the first row that disagrees, and reports it as an
    /// `ErrorKind::UnequalLengths` error. On success, the reader itself is
    /// returned so that a traversal can follow directly:
    ///
    /// ```
    /// use csvmap::Reader;
    ///
    /// let rdr = Reader::from_bytes("1,2,3\n4,5\n").unwrap();
    /// assert!(rdr.valid().is_err());
    ///
    /// let rdr = Reader::from_bytes("1,2,3\n4,5,6\n").unwrap();
    /// let mut n = 0;
    /// rdr.valid().unwrap().run(|_| n += 1).unwrap();
    /// assert_eq!(n, 6);
    /// ```
    pub fn valid(&self) -> Result<&Reader> {
        let bytes = self.bytes()?;
        let mut lens = RowLengths::new(&self.policy, Feeder::new(bytes));
        let expected_len = match lens.next() {
            None => return Ok(self),
            Some(len) => len,
        };
        for (i, len) in lens.enumerate() {
            if len != expected_len {
                let row = i as u64 + 2;
                debug!(expected_len, row, len, "column count mismatch");
                return Err(Error::new(ErrorKind::UnequalLengths {
                    expected_len,
                    row,
                    len,
                }));
            }
        }
        Ok(self)
    }

    /// Traverse every field as a value.
    pub fn run<V>(&self, value: V) -> Result<()>
    where
        V: FnMut(&BStr),
    {
        self.run_rows(value, ignore_row)
    }

    /// Traverse every field as a value, calling `row` at the end of each
    /// row.
    pub fn run_rows<V, R>(&self, value: V, row: R) -> Result<()>
    where
        V: FnMut(&BStr),
        R: FnMut(),
    {
        self.dispatch(false, &mut Callbacks { header: ignore_field, value, row })
    }

    /// Traverse the first row as headers and everything after it as values,
    /// calling `row` at the end of each row, the header row included.
    pub fn run_headers<H, V, R>(&self, header: H, value: V, row: R) -> Result<()>
    where
        H: FnMut(&BStr),
        V: FnMut(&BStr),
        R: FnMut(),
    {
        self.dispatch(true, &mut Callbacks { header, value, row })
    }

    /// Drive one materializing traversal into `handler`.
    ///
    /// When `has_headers` is true, the column count is determined first and
    /// that many leading fields are delivered as headers.
    pub fn dispatch<H>(&self, has_headers: bool, handler: &mut H) -> Result<()>
    where
        H: Handler + ?Sized,
    {
        let bytes = self.bytes()?;
        let mut router = Router::new(self.header_len(has_headers)?);
        let mut tok = Tokenizer::new(&self.policy);
        let mut deliver = |tok: &Tokenizer, boundary: Boundary| {
            let (slot, row_end) = router.route(boundary);
            let field = tok.field().as_bstr();
            match slot {
                Slot::Header => handler.header(field),
                Slot::Value => handler.value(field),
            }
            if row_end {
                handler.row();
            }
        };
        for b in Feeder::new(bytes) {
            if let Some(boundary) = tok.feed(b) {
                deliver(&tok, boundary);
            }
        }
        if let Some(boundary) = tok.finish() {
            deliver(&tok, boundary);
        }
        trace!(fields = router.fields, rows = router.rows, "traversal finished");
        Ok(())
    }

    /// Traverse every cell as a value, without copying.
    ///
    /// ```
    /// use csvmap::{Cell, Reader};
    ///
    /// let rdr = Reader::from_bytes("\"a,b\",c\n").unwrap();
    /// let mut cells: Vec<Cell> = vec![];
    /// rdr.run_span(|cell| cells.push(cell)).unwrap();
    /// assert_eq!(cells[0].raw(), b"\"a,b\"");
    /// assert_eq!(cells[0].to_vec(), b"a,b");
    /// assert_eq!(cells[1].to_vec(), b"c");
    /// ```
    pub fn run_span<'r, V>(&'r self, value: V) -> Result<()>
    where
        V: FnMut(Cell<'r>),
    {
        self.run_span_rows(value, ignore_row)
    }

    /// Traverse every cell as a value, calling `row` at the end of each row.
    pub fn run_span_rows<'r, V, R>(&'r self, value: V, row: R) -> Result<()>
    where
        V: FnMut(Cell<'r>),
        R: FnMut(),
    {
        self.dispatch_span(
            false,
            &mut Callbacks { header: ignore_cell, value, row },
        )
    }

    /// Traverse the first row's cells as headers and everything after it as
    /// values, calling `row` at the end of each row.
    pub fn run_span_headers<'r, H, V, R>(
        &'r self,
        header: H,
        value: V,
        row: R,
    ) -> Result<()>
    where
        H: FnMut(Cell<'r>),
        V: FnMut(Cell<'r>),
        R: FnMut(),
    {
        self.dispatch_span(true, &mut Callbacks { header, value, row })
    }

    /// Drive one zero-copy traversal into `handler`.
    ///
    /// Event order is identical to [`dispatch`](Reader::dispatch). A source
    /// without a trailing line terminator gets a synthesized one, which no
    /// cell ever covers.
    pub fn dispatch_span<'r, H>(
        &'r self,
        has_headers: bool,
        handler: &mut H,
    ) -> Result<()>
    where
        H: SpanHandler<'r> + ?Sized,
    {
        let bytes = self.bytes()?;
        let policy = &self.policy;
        let mut router = Router::new(self.header_len(has_headers)?);
        let mut tok = SpanTokenizer::new(policy);
        let mut deliver = |span: Span, boundary: Boundary| {
            let (slot, row_end) = router.route(boundary);
            let cell = Cell::new(bytes, policy, span);
            match slot {
                Slot::Header => handler.header(cell),
                Slot::Value => handler.value(cell),
            }
            if row_end {
                handler.row();
            }
        };
        for b in Feeder::new(bytes) {
            if let Some((span, boundary)) = tok.feed(b) {
                deliver(span, boundary);
            }
        }
        if let Some((span, boundary)) = tok.finish() {
            deliver(span, boundary);
        }
        trace!(fields = router.fields, rows = router.rows, "traversal finished");
        Ok(())
    }

    fn bytes(&self) -> Result<&[u8]> {
        Ok(self.source()?.as_bytes())
    }

    fn header_len(&self, has_headers: bool) -> Result<u64> {
        if has_headers {
            self.cols()
        } else {
            Ok(0)
        }
    }
}
