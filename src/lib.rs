/*!
The `csvmap` crate reads CSV data from a memory-mapped file or an in-memory
buffer, and reports its contents through callbacks.

A [`Reader`] owns its source and can be queried any number of times: its
column count, its row count, whether every row has as many fields as the
first, and full traversals that hand each field to a callback. Traversals
either materialize fields (unescaped and trimmed, as `&BStr`) or hand out
zero-copy [`Cell`]s that are only unescaped on demand.

Parsing itself never fails. Malformed quoting always resolves to some split
of the input; use [`Reader::valid`] to reject tables with ragged rows.

# Example

```
use csvmap::{ReaderBuilder, Trim};

# fn example() -> csvmap::Result<()> {
let rdr = ReaderBuilder::new()
    .trim(Trim::Whitespace)
    .from_bytes("name, note\nfoo, \"say \"\"hi\"\"\"\nbar, \"a,b\"\n")?;

let mut notes = vec![];
rdr.valid()?.run_headers(|_| {}, |field| notes.push(field.to_string()), || {})?;
assert_eq!(notes, vec!["foo", "say \"hi\"", "bar", "a,b"]);
# Ok(()) }
# example().unwrap();
```
*/

#![deny(missing_docs)]

pub use csvmap_core::{Policy, Span, Trim};

pub use crate::cell::Cell;
pub use crate::dispatch::{Handler, SpanHandler};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::reader::{Reader, ReaderBuilder, Shape};
pub use crate::source::{BufferSource, Feeder, MmapSource, Source};

mod cell;
mod dispatch;
mod error;
mod reader;
mod source;
