/*!
`csvmap-core` provides the field grammar used by `csvmap`.

It contains no I/O. Every type in this crate is a push-based state machine
that consumes one byte at a time. Callers are expected to feed a stream that
ends in exactly one line terminator (`\n`); `csvmap`'s `Feeder` guarantees
this by synthesizing a terminator when the source lacks one.

# Overview

* [`Splitter`] decides where fields and rows end. It tracks nothing but quote
  parity, and every other type here is built on top of it.
* [`Tokenizer`] materializes fields: it copies bytes into a reusable buffer,
  collapses doubled quotes, strips a wrapping quote pair and applies the trim
  policy.
* [`SpanTokenizer`] emits [`Span`]s, offset pairs into the caller's input. The
  content is only unescaped when asked for, through [`field::unescape`].
* [`ColumnCounter`], [`RowCounter`] and [`RowLengths`] replay the grammar to
  compute the shape of a table without looking at field content.

# Grammar

The grammar is deliberately more forgiving than RFC 4180 and never fails.
A quote character opens a quoted run anywhere in a field. Inside the run, a
delimiter or line terminator is content while the number of quotes seen so far
is odd. Once the count is even, the next delimiter or terminator ends the
field. Doubled quotes collapse to one literal quote. The outer wrapping quote
pair is only removed when nothing but whitespace preceded the opening quote,
so `a "b" c` keeps its quotes while ` "b c" ` becomes ` b c `.

```
use csvmap_core::{Boundary, Policy, Tokenizer};

let mut tok = Tokenizer::new(&Policy::default());
let mut fields = vec![];
for &b in b"\"a\"\"b\",c\n" {
    if let Some(boundary) = tok.feed(b) {
        fields.push((tok.field().to_vec(), boundary));
    }
}
assert_eq!(fields, vec![
    (b"a\"b".to_vec(), Boundary::Field),
    (b"c".to_vec(), Boundary::Row),
]);
```
*/

#![deny(missing_docs)]

pub use crate::counter::{ColumnCounter, RowCounter, RowLengths};
pub use crate::policy::{Policy, Trim};
pub use crate::tokenizer::{
    Boundary, Span, SpanTokenizer, Splitter, Tokenizer,
};

mod counter;
pub mod field;
mod policy;
mod tokenizer;

/// The line terminator. Rows always end with this byte.
pub const LF: u8 = b'\n';
