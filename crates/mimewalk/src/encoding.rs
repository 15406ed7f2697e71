//! Content-Transfer-Encoding decoding.
//!
//! Supports Base64 and Quoted-Printable; every other encoding is passed
//! through untouched.

use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use std::fmt;
use std::io::{self, Read};

/// Standard alphabet, canonical padding required, stray trailing bits
/// tolerated.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    #[default]
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    ///
    /// Unknown names map to [`TransferEncoding::SevenBit`], which is decoded
    /// as a passthrough.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Checks whether `b` belongs to the base64 alphabet (padding included).
#[must_use]
pub const fn is_base64_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' | b'=')
}

/// Reader adapter that drops every byte outside the base64 alphabet.
///
/// Line breaks, whitespace and stray characters in wrapped base64 bodies
/// never reach the decoder. Accepted bytes are passed through unchanged.
#[derive(Debug)]
pub struct Base64Cleaner<R> {
    inner: R,
}

impl<R: Read> Base64Cleaner<R> {
    /// Wraps `inner`.
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> Read for Base64Cleaner<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // A zero-length result means EOF, so keep pulling until something
        // survives the filter.
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                let b = buf[i];
                if is_base64_byte(b) {
                    buf[kept] = b;
                    kept += 1;
                }
            }
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}

/// Decodes a transfer-encoded body.
///
/// `encoding` is the raw `Content-Transfer-Encoding` value; `None` or an
/// unknown name returns the body unchanged. The reader is drained
/// completely.
///
/// # Errors
///
/// Returns an error if reading fails or the body is not valid for the
/// declared encoding.
pub fn decode(encoding: Option<&str>, mut reader: impl Read) -> Result<Vec<u8>> {
    let encoding = encoding.map_or(TransferEncoding::SevenBit, TransferEncoding::parse);

    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;

    let decoded = match encoding {
        TransferEncoding::Base64 => decode_base64(&raw)?,
        TransferEncoding::QuotedPrintable => decode_quoted_printable(&raw)?,
        _ => raw,
    };

    tracing::trace!(%encoding, len = decoded.len(), "decoded body");
    Ok(decoded)
}

/// Decodes Base64 data, ignoring bytes outside the alphabet.
///
/// # Errors
///
/// Returns an error if the cleaned input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let mut cleaned = Vec::with_capacity(data.len());
    Base64Cleaner::new(data).read_to_end(&mut cleaned)?;
    Ok(BASE64.decode(cleaned)?)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed, `=XX` escapes resolved (either hex case),
/// and trailing whitespace before a hard line break is dropped. Hard line
/// breaks are kept as they appear.
///
/// # Errors
///
/// Returns [`Error::Decode`] for an `=` not followed by two hex digits or a
/// line break.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());

    for (index, line) in data.split_inclusive(|&b| b == b'\n').enumerate() {
        let (content, eol): (&[u8], &[u8]) = if let Some(c) = line.strip_suffix(b"\r\n") {
            (c, b"\r\n")
        } else if let Some(c) = line.strip_suffix(b"\n") {
            (c, b"\n")
        } else {
            (line, b"")
        };
        let content = content.trim_ascii_end();

        // A trailing `=` can never end an escape, so it is always a soft break.
        let (content, soft) = content
            .strip_suffix(b"=")
            .map_or((content, false), |c| (c, true));

        let mut i = 0;
        while i < content.len() {
            let b = content[i];
            if b != b'=' {
                out.push(b);
                i += 1;
                continue;
            }
            let escaped = content
                .get(i + 1..i + 3)
                .and_then(|hex| Some((hex_value(hex[0])? << 4) | hex_value(hex[1])?));
            let Some(byte) = escaped else {
                return Err(Error::Decode(format!(
                    "invalid quoted-printable escape on line {}",
                    index + 1
                )));
            };
            out.push(byte);
            i += 3;
        }

        if !soft {
            out.extend_from_slice(eol);
        }
    }

    Ok(out)
}

pub(crate) const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("Quoted-Printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("binary"), TransferEncoding::Binary);
    }

    #[test]
    fn test_cleaner_filters_non_alphabet() {
        let mut out = Vec::new();
        Base64Cleaner::new(&b"SGVs\r\nbG8s*IFdv\tcmxk IQ==\r\n"[..])
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, b"SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_cleaner_all_filtered_is_eof() {
        let mut out = Vec::new();
        let n = Base64Cleaner::new(&b"\r\n\r\n  "[..])
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_decode_base64_wrapped() {
        let body = b"SGVsbG8s\r\nIFdvcmxk\r\nIQ==\r\n";
        assert_eq!(decode(Some("base64"), &body[..]).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_decode_base64_bad_length() {
        let err = decode(Some("base64"), &b"SGVsbG8"[..]).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_decode_base64_missing_padding() {
        assert!(decode_base64(b"SGk").is_err());
        assert_eq!(decode_base64(b"SGk=").unwrap(), b"Hi");
    }

    #[test]
    fn test_decode_passthrough() {
        let body = b"=C3 raw\r\nbytes";
        assert_eq!(decode(None, &body[..]).unwrap(), body);
        assert_eq!(decode(Some("8bit"), &body[..]).unwrap(), body);
        assert_eq!(decode(Some("x-custom"), &body[..]).unwrap(), body);
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode(Some("quoted-printable"), &b"Caf=C3=A9"[..]).unwrap();
        assert_eq!(decoded, "Café".as_bytes());
    }

    #[test]
    fn test_quoted_printable_lowercase_hex() {
        assert_eq!(decode_quoted_printable(b"a=3db").unwrap(), b"a=b");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(
            decode_quoted_printable(b"Hello=\r\nWorld").unwrap(),
            b"HelloWorld"
        );
        assert_eq!(decode_quoted_printable(b"Hello=  \nWorld").unwrap(), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_hard_breaks_kept() {
        assert_eq!(
            decode_quoted_printable(b"one  \r\ntwo\r\n").unwrap(),
            b"one\r\ntwo\r\n"
        );
    }

    #[test]
    fn test_quoted_printable_trailing_soft_break() {
        assert_eq!(decode_quoted_printable(b"end=").unwrap(), b"end");
        assert_eq!(decode_quoted_printable(b"x=3D").unwrap(), b"x=");
    }

    #[test]
    fn test_quoted_printable_invalid_escape() {
        assert!(matches!(
            decode_quoted_printable(b"bad =ZZ escape"),
            Err(Error::Decode(_))
        ));
        assert!(matches!(
            decode_quoted_printable(b"short =A"),
            Err(Error::Decode(_))
        ));
    }

    proptest! {
        #[test]
        fn base64_survives_line_breaks_and_stray_byte(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            width in 1usize..80,
            stray in prop::sample::select(vec![b'*', b'!', b'.', b'-', b'\t', 0u8, 0xffu8]),
            stray_at in any::<prop::sample::Index>(),
        ) {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&data);
            let mut wrapped = Vec::new();
            for chunk in encoded.as_bytes().chunks(width) {
                wrapped.extend_from_slice(chunk);
                wrapped.extend_from_slice(b"\r\n");
            }
            let at = stray_at.index(wrapped.len() + 1);
            wrapped.insert(at, stray);

            let decoded = decode(Some("base64"), &wrapped[..]).unwrap();
            prop_assert_eq!(decoded, data);
        }
    }
}
