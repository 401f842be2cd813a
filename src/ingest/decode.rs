//! Byte-to-text decoding for raw log input.

use std::borrow::Cow;

/// Text encoding applied to raw input lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputEncoding {
    /// UTF-8, silently dropping invalid byte sequences.
    #[default]
    Utf8,
    /// ISO-8859-1: one byte per character.
    Latin1,
}

impl std::fmt::Display for InputEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputEncoding::Utf8 => write!(f, "utf8"),
            InputEncoding::Latin1 => write!(f, "latin1"),
        }
    }
}

/// Decode one raw line. Never fails.
pub fn decode_line(bytes: &[u8], encoding: InputEncoding) -> Cow<'_, str> {
    match encoding {
        InputEncoding::Utf8 => match std::str::from_utf8(bytes) {
            Ok(s) => Cow::Borrowed(s),
            Err(_) => Cow::Owned(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
        },
        InputEncoding::Latin1 => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8_is_borrowed() {
        let decoded = decode_line(b"GET /index.html", InputEncoding::Utf8);
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "GET /index.html");
    }

    #[test]
    fn test_invalid_utf8_bytes_are_dropped() {
        let decoded = decode_line(b"GET /ind\xffex\xc3.html", InputEncoding::Utf8);
        assert_eq!(decoded, "GET /index.html");
    }

    #[test]
    fn test_latin1_maps_every_byte() {
        let decoded = decode_line(b"caf\xe9", InputEncoding::Latin1);
        assert_eq!(decoded, "café");
    }
}
