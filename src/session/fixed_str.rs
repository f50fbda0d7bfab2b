//! Fixed-width string field.
//!
//! Session state must encode to the same number of bytes every time, so
//! strings are stored as NUL-padded byte arrays and serialized as a tuple of
//! exactly `N` bytes (no length prefix).

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A NUL-terminated string in `N` bytes. Holds at most `N - 1` bytes of text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedStr<const N: usize>([u8; N]);

impl<const N: usize> FixedStr<N> {
    /// Copy `text`, truncating on a char boundary to fit.
    pub fn new(text: &str) -> Self {
        let mut value = Self::default();
        value.set(text);
        value
    }

    /// Replace the contents.
    pub fn set(&mut self, text: &str) {
        let mut len = text.len().min(N.saturating_sub(1));
        while !text.is_char_boundary(len) {
            len -= 1;
        }
        self.0 = [0; N];
        self.0[..len].copy_from_slice(&text.as_bytes()[..len]);
    }

    /// Clear to the empty string.
    pub fn clear(&mut self) {
        self.0 = [0; N];
    }

    /// Text up to the first NUL. Invalid UTF-8 is cut at the first bad byte.
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        let bytes = &self.0[..len];
        match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => std::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default(),
        }
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.first().map_or(true, |&b| b == 0)
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> Serialize for FixedStr<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(N)?;
        for byte in &self.0 {
            tuple.serialize_element(byte)?;
        }
        tuple.end()
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedStr<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BytesVisitor<const M: usize>(PhantomData<[u8; M]>);

        impl<'de, const M: usize> Visitor<'de> for BytesVisitor<M> {
            type Value = FixedStr<M>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} bytes", M)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut bytes = [0u8; M];
                for (i, byte) in bytes.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                Ok(FixedStr(bytes))
            }
        }

        deserializer.deserialize_tuple(N, BytesVisitor::<N>(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_text() {
        let value = FixedStr::<16>::new("single_1");
        assert_eq!(value.as_str(), "single_1");
        assert!(!value.is_empty());
        assert!(FixedStr::<16>::default().is_empty());
    }

    #[test]
    fn test_truncates_and_keeps_terminator() {
        let value = FixedStr::<4>::new("abcdef");
        assert_eq!(value.as_str(), "abc");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        // 'é' is two bytes; only one byte of room remains after "ab"
        let value = FixedStr::<4>::new("abé");
        assert_eq!(value.as_str(), "ab");
    }

    #[test]
    fn test_encoded_width_is_fixed() {
        let short = bincode::serialize(&FixedStr::<32>::new("a")).unwrap();
        let long = bincode::serialize(&FixedStr::<32>::new("a much longer string value")).unwrap();
        assert_eq!(short.len(), 32);
        assert_eq!(long.len(), 32);

        let decoded: FixedStr<32> = bincode::deserialize(&long).unwrap();
        assert_eq!(decoded.as_str(), "a much longer string value");
    }

    #[test]
    fn test_invalid_utf8_is_cut() {
        let mut raw = [0u8; 8];
        raw[..3].copy_from_slice(&[b'o', b'k', 0xff]);
        let value = FixedStr(raw);
        assert_eq!(value.as_str(), "ok");
    }
}
