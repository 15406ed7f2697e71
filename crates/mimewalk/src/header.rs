//! MIME header block reading.

use crate::error::{Error, Result};

/// Ordered collection of header fields.
///
/// Field names are stored in canonical form (`content-type` becomes
/// `Content-Type`) in order of first appearance; repeated fields keep all of
/// their values in document order. Lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Headers {
    fields: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = canonical_name(name.as_ref());
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((name, vec![value])),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.values(name)
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of distinct field names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns an iterator over field names and their values, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    fn values(&self, name: &str) -> Option<&Vec<String>> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Reads a header block from the start of `input`.
    ///
    /// Lines may end in CRLF or a bare LF. Reading stops at the first empty
    /// line; the returned offset points just past it, at the first byte of
    /// the body. Folded lines are joined with a single space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HeaderRead`] if the block starts with a continuation
    /// line, contains a line without a colon or with an invalid field name,
    /// or ends before the terminating empty line.
    pub fn read(input: &[u8]) -> Result<(Self, usize)> {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;
        let mut pos = 0;

        loop {
            let Some(nl) = input[pos..].iter().position(|&b| b == b'\n') else {
                return Err(Error::HeaderRead(
                    "unexpected end of input in header block".to_string(),
                ));
            };
            let raw = &input[pos..pos + nl];
            let line = raw.strip_suffix(b"\r").unwrap_or(raw);
            pos += nl + 1;

            if line.is_empty() {
                break;
            }

            if line[0] == b' ' || line[0] == b'\t' {
                let Some((_, value)) = current.as_mut() else {
                    return Err(Error::HeaderRead(format!(
                        "malformed initial header line: {:?}",
                        String::from_utf8_lossy(line)
                    )));
                };
                let folded = String::from_utf8_lossy(line);
                let folded = folded.trim();
                if !folded.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(folded);
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            let Some(colon) = line.iter().position(|&b| b == b':') else {
                return Err(Error::HeaderRead(format!(
                    "malformed header line: {:?}",
                    String::from_utf8_lossy(line)
                )));
            };
            let name = &line[..colon];
            if name.is_empty() || !name.iter().all(|&b| is_field_name_byte(b)) {
                return Err(Error::HeaderRead(format!(
                    "invalid header field name: {:?}",
                    String::from_utf8_lossy(name)
                )));
            }
            let value = String::from_utf8_lossy(&line[colon + 1..]);
            current = Some((
                String::from_utf8_lossy(name).into_owned(),
                value.trim().to_string(),
            ));
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        Ok((headers, pos))
    }
}

/// Printable ASCII other than colon.
const fn is_field_name_byte(b: u8) -> bool {
    b > 0x20 && b < 0x7f && b != b':'
}

/// Canonicalizes a field name: first letter and letters following a hyphen
/// upper-cased, everything else lower-cased.
fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
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

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("content-type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.iter().next().unwrap().0, "Content-Type");
    }

    #[test]
    fn test_headers_repeated_fields_keep_order() {
        let mut headers = Headers::new();
        headers.add("Received", "from a");
        headers.add("Subject", "Hi");
        headers.add("received", "from b");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_all("Received"), vec!["from a", "from b"]);
        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Received", "Subject"]);
    }

    #[test]
    fn test_headers_read() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "body"
        );

        let (headers, offset) = Headers::read(text.as_bytes()).unwrap();
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(&text.as_bytes()[offset..], b"body");
    }

    #[test]
    fn test_headers_read_bare_lf() {
        let text = b"Content-Type: text/html\nX-Empty:\n\nrest";
        let (headers, offset) = Headers::read(text).unwrap();
        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("x-empty"), Some(""));
        assert_eq!(&text[offset..], b"rest");
    }

    #[test]
    fn test_headers_read_empty_block() {
        let (headers, offset) = Headers::read(b"\r\nbody").unwrap();
        assert!(headers.is_empty());
        assert_eq!(offset, 2);
    }

    #[test]
    fn test_headers_read_truncated() {
        let err = Headers::read(b"Subject: no end\r\n").unwrap_err();
        assert!(matches!(err, Error::HeaderRead(_)));
    }

    #[test]
    fn test_headers_read_leading_continuation() {
        let err = Headers::read(b"  folded\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::HeaderRead(_)));
    }

    #[test]
    fn test_headers_read_missing_colon() {
        let err = Headers::read(b"Subject Hi\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::HeaderRead(_)));
    }

    #[test]
    fn test_headers_read_space_in_name() {
        let err = Headers::read(b"Bad Name: x\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::HeaderRead(_)));
    }
}
