//! 8-bit character sets for fixed-length text fields.

use std::borrow::Cow;

use encoding_rs::mem;

/// Character set of a text field. Every byte maps to exactly one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// 7-bit ASCII. Bytes above `0x7F` are carried through unchanged.
    Ascii,
    /// ISO-8859-1.
    Latin1,
}

impl Charset {
    /// Byte-for-byte interpretation; no validation.
    ///
    /// Bytes above `0x7F` in an ASCII field come through as their Latin-1
    /// code points.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        mem::decode_latin1(bytes)
    }

    /// Inverse of [decode](Self::decode): every character up to U+00FF
    /// becomes one byte.
    ///
    /// Returns `None` when `text` holds a character above U+00FF.
    pub fn encode<'a>(&self, text: &'a str) -> Option<Cow<'a, [u8]>> {
        match self {
            Charset::Ascii | Charset::Latin1 if mem::is_str_latin1(text) => {
                Some(mem::encode_latin1_lossy(text))
            }
            _ => None,
        }
    }
}
