use bstr::BString;

use crate::field;
use crate::LF;

/// The trimming policy applied to every field once it has been unescaped.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Trim {
    /// Fields are passed through as is.
    None,
    /// Every byte in the given set is removed from both ends of a field.
    Chars(BString),
    /// Space, tab, CR and LF are removed from both ends of a field.
    Whitespace,
}

impl Trim {
    /// A convenience constructor for `Trim::Chars`.
    pub fn chars<B: AsRef<[u8]>>(set: B) -> Trim {
        Trim::Chars(BString::from(set.as_ref()))
    }

    /// Return the subslice of `field` that survives this policy.
    pub fn apply<'a>(&self, field: &'a [u8]) -> &'a [u8] {
        &field[self.range(field)]
    }

    /// Trim `buf` in place.
    pub fn apply_vec(&self, buf: &mut Vec<u8>) {
        let range = self.range(buf);
        buf.truncate(range.end);
        buf.drain(..range.start);
    }

    fn range(&self, field: &[u8]) -> core::ops::Range<usize> {
        match *self {
            Trim::None => 0..field.len(),
            Trim::Chars(ref set) => {
                field::trim_range(field, |b| set.iter().any(|&c| c == b))
            }
            Trim::Whitespace => field::trim_range(field, field::is_whitespace),
        }
    }
}

impl Default for Trim {
    fn default() -> Trim {
        Trim::None
    }
}

/// The policy a reader applies to every traversal.
///
/// A policy is resolved once, when a reader is built, and cannot be changed
/// afterwards.
///
/// With the `serde` feature enabled, the delimiter and quote are written as
/// single characters, so a policy reads naturally from a config file:
/// `{"delimiter": ";", "quote": "'", "trim": "whitespace"}`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Policy {
    /// The field delimiter. The default is `b','`.
    #[cfg_attr(feature = "serde", serde(with = "byte_char"))]
    pub delimiter: u8,
    /// The quote character. The default is `b'"'`.
    #[cfg_attr(feature = "serde", serde(with = "byte_char"))]
    pub quote: u8,
    /// The trimming policy. The default is `Trim::None`.
    pub trim: Trim,
}

impl Default for Policy {
    fn default() -> Policy {
        Policy { delimiter: b',', quote: b'"', trim: Trim::None }
    }
}

impl Policy {
    /// Returns true if `b` ends a field outside of a quoted run.
    #[inline]
    pub fn is_limiter(&self, b: u8) -> bool {
        b == self.delimiter || b == LF
    }
}

#[cfg(feature = "serde")]
mod byte_char {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(b: &u8, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_char(char::from(*b))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let c = char::deserialize(d)?;
        u8::try_from(c).map_err(|_| {
            de::Error::custom(format!(
                "expected a single-byte character, got {:?}",
                c
            ))
        })
    }
}
