use core::ops::Range;

use crate::field;
use crate::policy::Policy;
use crate::LF;

/// What ended a field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Boundary {
    /// The field was ended by a delimiter. More fields follow in this row.
    Field,
    /// The field was ended by a line terminator, and so was its row.
    Row,
}

impl Boundary {
    /// Returns true if this boundary also ends a row.
    #[inline]
    pub fn is_row(&self) -> bool {
        *self == Boundary::Row
    }
}

/// The boundary machine shared by every tokenizer and counter.
///
/// A splitter is in one of two states. In the *normal* state it is
/// accumulating an unquoted field. A quote byte moves it to the *quoted*
/// state, where it counts quotes. Delimiters and terminators are content
/// while that count is odd. The first delimiter or terminator seen with an
/// even count closes the field and returns the splitter to the normal state.
///
/// A splitter never fails. Every byte sequence has exactly one split.
#[derive(Clone, Debug)]
pub struct Splitter {
    delimiter: u8,
    quote: u8,
    /// Quotes seen since the current quoted run opened. Zero means the
    /// splitter is in the normal state.
    quotes: u64,
}

impl Splitter {
    /// Create a splitter for the given policy.
    pub fn new(policy: &Policy) -> Splitter {
        Splitter { delimiter: policy.delimiter, quote: policy.quote, quotes: 0 }
    }

    /// Feed one byte, returning the boundary it produced, if any.
    #[inline]
    pub fn feed(&mut self, b: u8) -> Option<Boundary> {
        if b == self.quote {
            self.quotes += 1;
            return None;
        }
        if self.quotes % 2 == 1 {
            return None;
        }
        let boundary = if b == LF {
            Boundary::Row
        } else if b == self.delimiter {
            Boundary::Field
        } else {
            return None;
        };
        self.quotes = 0;
        Some(boundary)
    }

    /// Signal the end of input.
    ///
    /// If a quoted run was never closed, the field it belongs to is ended
    /// here, along with its row. Otherwise the final terminator has already
    /// ended everything and this returns `None`.
    pub fn finish(&mut self) -> Option<Boundary> {
        if self.quotes == 0 {
            return None;
        }
        self.quotes = 0;
        Some(Boundary::Row)
    }

    /// Returns true if the current field has entered a quoted run.
    #[inline]
    pub fn is_quoted(&self) -> bool {
        self.quotes > 0
    }

    /// Forget everything about the field in progress.
    pub fn reset(&mut self) {
        self.quotes = 0;
    }
}

/// A tokenizer that materializes every field.
///
/// Bytes are copied into an internal buffer that is reused from one field to
/// the next. When [`feed`](Tokenizer::feed) returns a boundary, the finished
/// field is available from [`field`](Tokenizer::field) until the next call to
/// `feed`.
///
/// An empty field is still a field: a boundary is returned and `field`
/// returns an empty slice. "No field yet" is `feed` returning `None`.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    splitter: Splitter,
    policy: Policy,
    buf: Vec<u8>,
    /// Whether the field was blank when its quoted run opened.
    wrapped: bool,
    /// Whether `buf` holds a finished field that must be cleared first.
    done: bool,
}

impl Tokenizer {
    /// Create a tokenizer for the given policy.
    pub fn new(policy: &Policy) -> Tokenizer {
        Tokenizer {
            splitter: Splitter::new(policy),
            policy: policy.clone(),
            buf: Vec::with_capacity(256),
            wrapped: false,
            done: false,
        }
    }

    /// Feed one byte, returning the boundary it produced, if any.
    pub fn feed(&mut self, b: u8) -> Option<Boundary> {
        if self.done {
            self.clear();
        }
        let opening = b == self.policy.quote && !self.splitter.is_quoted();
        match self.splitter.feed(b) {
            Some(boundary) => {
                self.close();
                Some(boundary)
            }
            None if opening => {
                self.wrapped = field::is_blank(&self.buf);
                if !self.wrapped {
                    self.buf.push(b);
                }
                None
            }
            None => {
                self.buf.push(b);
                None
            }
        }
    }

    /// Signal the end of input.
    ///
    /// This only produces a field when a quoted run was left open, in which
    /// case the final line terminator is not counted as content.
    pub fn finish(&mut self) -> Option<Boundary> {
        if self.done {
            self.clear();
        }
        let boundary = self.splitter.finish()?;
        if self.buf.last() == Some(&LF) {
            self.buf.pop();
        }
        self.close();
        Some(boundary)
    }

    /// The most recently finished field.
    ///
    /// This is only meaningful right after `feed` or `finish` returned a
    /// boundary.
    pub fn field(&self) -> &[u8] {
        &self.buf
    }

    /// The policy this tokenizer applies.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Reset the tokenizer such that it behaves as if it had never been
    /// used.
    pub fn reset(&mut self) {
        self.splitter.reset();
        self.clear();
    }

    fn close(&mut self) {
        field::finish(&mut self.buf, self.wrapped, &self.policy);
        self.done = true;
    }

    fn clear(&mut self) {
        self.buf.clear();
        self.wrapped = false;
        self.done = false;
    }
}

/// The offsets of one field's raw bytes in the input.
///
/// `start..end` never includes the delimiter or terminator that ended the
/// field. A span copies nothing; pass its raw bytes to
/// [`field::unescape`] to get the value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Span {
    /// The offset of the first raw byte.
    pub start: usize,
    /// One past the offset of the last raw byte.
    pub end: usize,
}

impl Span {
    /// This span as a range, suitable for slicing the input.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The number of raw bytes covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the field has no raw bytes at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A tokenizer that reports fields as spans of its input.
///
/// The span tokenizer counts input offsets itself, starting at `0`. The
/// first byte fed is offset `0`, the next `1` and so on. A synthesized
/// trailing terminator is therefore at offset `len`, one past the input, and
/// is never part of any span.
#[derive(Clone, Debug)]
pub struct SpanTokenizer {
    splitter: Splitter,
    start: usize,
    pos: usize,
    last: Option<u8>,
}

impl SpanTokenizer {
    /// Create a span tokenizer for the given policy.
    pub fn new(policy: &Policy) -> SpanTokenizer {
        SpanTokenizer {
            splitter: Splitter::new(policy),
            start: 0,
            pos: 0,
            last: None,
        }
    }

    /// Feed the next byte, returning the span of the field it ended, if any.
    #[inline]
    pub fn feed(&mut self, b: u8) -> Option<(Span, Boundary)> {
        let at = self.pos;
        self.pos += 1;
        self.last = Some(b);
        let boundary = self.splitter.feed(b)?;
        let span = Span { start: self.start, end: at };
        self.start = self.pos;
        Some((span, boundary))
    }

    /// Signal the end of input.
    ///
    /// Like [`Tokenizer::finish`], this only produces a span when a quoted
    /// run was left open. The final terminator is excluded from that span.
    pub fn finish(&mut self) -> Option<(Span, Boundary)> {
        let boundary = self.splitter.finish()?;
        let end = match self.last {
            Some(LF) => self.pos - 1,
            _ => self.pos,
        };
        let span = Span { start: self.start, end };
        self.start = self.pos;
        Some((span, boundary))
    }

    /// The offset of the next byte to be fed.
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::{Boundary, Span, SpanTokenizer, Splitter, Tokenizer};
    use crate::field;
    use crate::policy::{Policy, Trim};

    type Csv = Vec<Row>;
    type Row = Vec<String>;

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            #[allow(unused_mut)]
            fn x() -> Csv {
                let mut csv = Csv::new();
                $(
                    let mut row = Row::new();
                    $(
                        row.push(String::from($field));
                    )*
                    csv.push(row);
                )*
                csv
            }
            x()
        }}
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |policy| policy);
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut policy = Policy::default();
                $config(&mut policy);

                let got = parse_by_copy(&policy, $data);
                let expected = $expected;
                assert_eq!(expected, got, "materialized");

                let got = parse_by_span(&policy, $data);
                assert_eq!(expected, got, "spans");
            }
        };
    }

    // Mimics the feeder: one trailing terminator, real or synthesized.
    fn fed(data: &str) -> Vec<u8> {
        let mut bytes = data.as_bytes().to_vec();
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        bytes
    }

    fn parse_by_copy(policy: &Policy, data: &str) -> Csv {
        let mut tok = Tokenizer::new(policy);
        let mut csv = Csv::new();
        let mut row = Row::new();
        let mut take = |tok: &Tokenizer, boundary: Boundary| {
            row.push(String::from_utf8(tok.field().to_vec()).unwrap());
            if boundary.is_row() {
                csv.push(std::mem::replace(&mut row, Row::new()));
            }
        };
        for b in fed(data) {
            if let Some(boundary) = tok.feed(b) {
                take(&tok, boundary);
            }
        }
        if let Some(boundary) = tok.finish() {
            take(&tok, boundary);
        }
        csv
    }

    fn parse_by_span(policy: &Policy, data: &str) -> Csv {
        let input = data.as_bytes();
        let mut tok = SpanTokenizer::new(policy);
        let mut csv = Csv::new();
        let mut row = Row::new();
        let mut out = vec![];
        let mut take = |span: Span, boundary: Boundary| {
            assert!(span.end <= input.len(), "span {:?} out of bounds", span);
            field::unescape(&input[span.range()], policy, &mut out);
            row.push(String::from_utf8(out.clone()).unwrap());
            if boundary.is_row() {
                csv.push(std::mem::replace(&mut row, Row::new()));
            }
        };
        for b in fed(data) {
            if let Some((span, boundary)) = tok.feed(b) {
                take(span, boundary);
            }
        }
        if let Some((span, boundary)) = tok.finish() {
            take(span, boundary);
        }
        csv
    }

    parses_to!(one_row_one_field, "a", csv![["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_lf, "a\n", csv![["a"]]);
    parses_to!(one_row_many_fields_lf, "a,b,c\n", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma_lf, "a,b,\n", csv![["a", "b", ""]]);
    parses_to!(one_row_crlf_keeps_cr, "a,b\r\n", csv![["a", "b\r"]]);

    parses_to!(many_rows_one_field, "a\nb", csv![["a"], ["b"]]);
    parses_to!(
        many_rows_many_fields,
        "a,b,c\nx,y,z",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(
        many_rows_trailing_comma_lf,
        "a,b,\nx,y,\n",
        csv![["a", "b", ""], ["x", "y", ""]]
    );

    parses_to!(only_lf, "\n", csv![[""]]);
    parses_to!(only_space, " ", csv![[" "]]);
    parses_to!(only_comma, ",", csv![["", ""]]);
    parses_to!(empty_lines_are_rows, "a\n\nb\n", csv![["a"], [""], ["b"]]);
    parses_to!(
        empty_middle_field,
        "one,two,three\nfour,,six",
        csv![["one", "two", "three"], ["four", "", "six"]]
    );

    parses_to!(quote_empty, "\"\"", csv![[""]]);
    parses_to!(quote_lf, "\"\"\n", csv![[""]]);
    parses_to!(quote_space, "\" \"", csv![[" "]]);
    parses_to!(quote_inner_space, "\" a \"", csv![[" a "]]);
    parses_to!(quote_outer_space, "  \"a\"  ", csv![["  a  "]]);
    parses_to!(quote_doubled, r#""a""b""#, csv![[r#"a"b"#]]);
    parses_to!(quote_delimiter, r#""a,b",c"#, csv![["a,b", "c"]]);
    parses_to!(quote_newline, "\"a\nb\",c", csv![["a\nb", "c"]]);
    parses_to!(
        quote_embedded_part,
        r#"2022,Mouse,What is quoted is necessary part "Hello, Tree!" of the sell,,"4900,00""#,
        csv![[
            "2022",
            "Mouse",
            r#"What is quoted is necessary part "Hello, Tree!" of the sell"#,
            "",
            "4900,00"
        ]]
    );
    parses_to!(
        quote_doubled_inside_wrapped,
        r#"2022, Mouse, "It's a correct use case: ""Hello, Christmas Tree!""" ,, "4900,00""#,
        csv![[
            "2022",
            " Mouse",
            r#" It's a correct use case: "Hello, Christmas Tree!" "#,
            "",
            " 4900,00"
        ]]
    );
    parses_to!(
        quote_single_inside_wrapped,
        r#"2022, Mouse, "It's incorrect to use "Hello, Christmas Tree!"" ,, "4900,00""#,
        csv![[
            "2022",
            " Mouse",
            r#" It's incorrect to use "Hello"#,
            r#" Christmas Tree!" "#,
            "",
            " 4900,00"
        ]]
    );
    parses_to!(quote_unclosed, "a,\"b", csv![["a", "b"]]);
    parses_to!(quote_unclosed_lf, "a,\"b\n", csv![["a", "b"]]);
    parses_to!(quote_unclosed_multiline, "\"a\nb\n", csv![["a\nb"]]);

    parses_to!(
        quote_change,
        "`just one, and only one, quoted cell`",
        csv![["just one, and only one, quoted cell"]],
        |p: &mut Policy| p.quote = b'`'
    );
    parses_to!(
        quote_default_ignores_backtick,
        "`just one, and only one, quoted cell`",
        csv![["`just one", " and only one", " quoted cell`"]]
    );
    parses_to!(
        delimiter_semicolon,
        "one;two;three\nfour;five;six",
        csv![["one", "two", "three"], ["four", "five", "six"]],
        |p: &mut Policy| p.delimiter = b';'
    );
    parses_to!(
        delimiter_tabs,
        "a\tb,c",
        csv![["a", "b,c"]],
        |p: &mut Policy| p.delimiter = b'\t'
    );

    parses_to!(
        trim_chars,
        "one, \ttwo , three \n four, five, six\n seven , eight\t , nine\r\n",
        csv![
            ["one", "two", "three"],
            ["four", "five", "six"],
            ["seven", "eight", "nine"]
        ],
        |p: &mut Policy| p.trim = Trim::chars(" \t\r")
    );
    parses_to!(
        trim_whitespace,
        "  \" a \" ,b\r\n",
        csv![["a", "b"]],
        |p: &mut Policy| p.trim = Trim::Whitespace
    );
    parses_to!(
        trim_whitespace_blank_field,
        "   \n",
        csv![[""]],
        |p: &mut Policy| p.trim = Trim::Whitespace
    );

    #[test]
    fn splitter_parity() {
        let mut s = Splitter::new(&Policy::default());
        assert_eq!(s.feed(b'"'), None);
        assert!(s.is_quoted());
        assert_eq!(s.feed(b','), None);
        assert_eq!(s.feed(b'"'), None);
        assert_eq!(s.feed(b','), Some(Boundary::Field));
        assert!(!s.is_quoted());
        assert_eq!(s.feed(b'\n'), Some(Boundary::Row));
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn splitter_finish_open_quote() {
        let mut s = Splitter::new(&Policy::default());
        assert_eq!(s.feed(b'"'), None);
        assert_eq!(s.feed(b'\n'), None);
        assert_eq!(s.finish(), Some(Boundary::Row));
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn field_buffer_is_reused() {
        let mut tok = Tokenizer::new(&Policy::default());
        assert_eq!(tok.feed(b'a'), None);
        assert_eq!(tok.feed(b','), Some(Boundary::Field));
        assert_eq!(tok.field(), b"a");
        assert_eq!(tok.feed(b','), Some(Boundary::Field));
        assert_eq!(tok.field(), b"");
        assert_eq!(tok.feed(b'b'), None);
        assert_eq!(tok.feed(b'\n'), Some(Boundary::Row));
        assert_eq!(tok.field(), b"b");
    }

    #[test]
    fn reset_forgets_quoted_run() {
        let mut tok = Tokenizer::new(&Policy::default());
        assert_eq!(tok.feed(b'"'), None);
        assert_eq!(tok.feed(b'x'), None);
        tok.reset();
        assert_eq!(tok.feed(b'y'), None);
        assert_eq!(tok.feed(b','), Some(Boundary::Field));
        assert_eq!(tok.field(), b"y");
    }

    #[test]
    fn spans_skip_synthetic_terminator() {
        let input = b"ab,c";
        let mut tok = SpanTokenizer::new(&Policy::default());
        let mut spans = vec![];
        for &b in input.iter().chain(Some(&b'\n')) {
            if let Some(got) = tok.feed(b) {
                spans.push(got);
            }
        }
        assert_eq!(tok.finish(), None);
        assert_eq!(
            spans,
            vec![
                (Span { start: 0, end: 2 }, Boundary::Field),
                (Span { start: 3, end: 4 }, Boundary::Row),
            ]
        );
        assert_eq!(tok.position(), input.len() + 1);
    }

    #[test]
    fn empty_span() {
        let span = Span { start: 3, end: 3 };
        assert!(span.is_empty());
        assert_eq!(span.len(), 0);
        assert_eq!(span.range(), 3..3);
    }
}
