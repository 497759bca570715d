//! A thin, opaque byte wrapper used for both keys and values.
//!
//! `Datum` carries an immutable byte sequence and converts losslessly
//! to/from a text-like representation, for callers that prefer to work
//! with strings at the edges while the store itself only ever sees
//! bytes.

use std::borrow::Cow;
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Datum(Vec<u8>);

impl Datum {
    pub fn new(data: Vec<u8>) -> Self {
        Datum(data)
    }

    /// Borrowed byte view.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the datum, returning the owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lossy text view, for display/debugging of keys that happen to be
    /// UTF-8. Does not fail on non-UTF-8 data.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Datum {
    fn from(data: Vec<u8>) -> Self {
        Datum(data)
    }
}

impl From<&[u8]> for Datum {
    fn from(data: &[u8]) -> Self {
        Datum(data.to_vec())
    }
}

impl From<String> for Datum {
    fn from(data: String) -> Self {
        Datum(data.into_bytes())
    }
}

impl From<&str> for Datum {
    fn from(data: &str) -> Self {
        Datum(data.as_bytes().to_vec())
    }
}

impl From<Datum> for Vec<u8> {
    fn from(datum: Datum) -> Self {
        datum.0
    }
}

impl AsRef<[u8]> for Datum {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bytes() {
        let d = Datum::new(vec![0x00, 0xff, 0x10]);
        assert_eq!(d.as_bytes(), &[0x00, 0xff, 0x10]);
        assert_eq!(d.clone().into_bytes(), vec![0x00, 0xff, 0x10]);
    }

    #[test]
    fn round_trips_text() {
        let d: Datum = "hello".into();
        assert_eq!(d.as_text(), "hello");
        assert_eq!(d.as_bytes(), b"hello");
    }

    #[test]
    fn lossy_on_non_utf8() {
        let d = Datum::new(vec![0xff, 0xfe]);
        assert_eq!(d.as_text(), "\u{fffd}\u{fffd}");
    }

    #[test]
    fn orders_like_bytes() {
        let a: Datum = "a".into();
        let b: Datum = "b".into();
        assert!(a < b);
    }
}
