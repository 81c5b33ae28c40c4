/*!
Field finalization.

These routines turn the raw bytes of one field into its value. The
[`Tokenizer`](crate::Tokenizer) runs them incrementally as it copies a field,
while [`unescape`] runs them over a raw span after the fact. Both paths end in
[`finish`], so a field materializes to the same bytes either way.
*/

use core::ops::Range;

use memchr::{memchr, memrchr};

use crate::policy::Policy;

/// The bytes considered whitespace by `Trim::Whitespace` and [`is_blank`].
pub const WHITESPACE: &[u8] = b" \t\r\n";

/// Returns true if `b` is one of [`WHITESPACE`].
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    WHITESPACE.contains(&b)
}

/// Returns the range of `field` left after removing every leading and
/// trailing byte that matches `pred`.
pub fn trim_range<F: Fn(u8) -> bool>(field: &[u8], pred: F) -> Range<usize> {
    let start = match field.iter().position(|&b| !pred(b)) {
        None => return 0..0,
        Some(start) => start,
    };
    // There is at least one byte not matching `pred`, so this always finds.
    let end = field.iter().rposition(|&b| !pred(b)).map_or(start, |i| i + 1);
    start..end
}

/// Returns `field` without leading or trailing whitespace.
pub fn trim_whitespace(field: &[u8]) -> &[u8] {
    &field[trim_range(field, is_whitespace)]
}

/// Returns true if `field` is empty once whitespace is trimmed.
///
/// A field that is blank right before its first quote is considered fully
/// quoted, and its wrapping quote pair is removed.
pub fn is_blank(field: &[u8]) -> bool {
    field.iter().all(|&b| is_whitespace(b))
}

/// Collapse every run of consecutive `quote` bytes into a single one.
pub fn collapse_quotes(buf: &mut Vec<u8>, quote: u8) {
    buf.dedup_by(|a, b| *a == quote && *b == quote);
}

/// Remove the last `quote` in `buf` if only whitespace follows it.
///
/// This is the closing half of a wrapping quote pair. `"abc" ` loses its
/// closing quote, while `"abc"def` keeps it.
pub fn strip_last_quote(buf: &mut Vec<u8>, quote: u8) {
    if let Some(pos) = memrchr(quote, buf) {
        if is_blank(&buf[pos + 1..]) {
            buf.remove(pos);
        }
    }
}

/// Finalize a field whose opening wrapping quote (if any) has already been
/// dropped.
///
/// When `wrapped` is true, the field was blank when its quoted run opened,
/// so the closing wrapping quote is stripped too.
pub fn finish(buf: &mut Vec<u8>, wrapped: bool, policy: &Policy) {
    if wrapped {
        strip_last_quote(buf, policy.quote);
    }
    if memchr(policy.quote, buf).is_some() {
        collapse_quotes(buf, policy.quote);
    }
    policy.trim.apply_vec(buf);
}

/// Unescape the raw bytes of one field into `out`.
///
/// `raw` must be exactly the bytes between two field boundaries, not
/// including the delimiter or terminator. `out` is cleared first, so calling
/// this repeatedly with the same inputs always yields the same value.
pub fn unescape(raw: &[u8], policy: &Policy, out: &mut Vec<u8>) {
    out.clear();
    let wrapped = match memchr(policy.quote, raw) {
        None => {
            out.extend_from_slice(raw);
            false
        }
        Some(open) => {
            let (head, tail) = (&raw[..open], &raw[open + 1..]);
            let wrapped = is_blank(head);
            out.extend_from_slice(head);
            if !wrapped {
                out.push(policy.quote);
            }
            out.extend_from_slice(tail);
            wrapped
        }
    };
    finish(out, wrapped, policy);
}
