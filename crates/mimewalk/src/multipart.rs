//! Boundary-delimited part enumeration (RFC 2046 §5.1).

use crate::error::{Error, Result};
use crate::header::Headers;

/// Iterator over the parts of a multipart body.
///
/// Yields each part's headers and raw (still transfer-encoded) body in
/// document order. The preamble before the first delimiter and the epilogue
/// after the closing delimiter are skipped. The line ending style is taken
/// from the first delimiter line, so both CRLF and bare-LF documents work.
///
/// The iterator ends with `None` at the closing `--boundary--` line. Broken
/// framing yields one `Err` and then `None`.
#[derive(Debug)]
pub struct Parts<'a> {
    data: &'a [u8],
    pos: usize,
    dash_boundary: Vec<u8>,
    nl: &'static [u8],
    parts_read: usize,
    done: bool,
}

impl<'a> Parts<'a> {
    /// Creates an enumerator over `data` for the given boundary token.
    #[must_use]
    pub fn new(data: &'a [u8], boundary: &str) -> Self {
        let mut dash_boundary = Vec::with_capacity(boundary.len() + 2);
        dash_boundary.extend_from_slice(b"--");
        dash_boundary.extend_from_slice(boundary.as_bytes());
        Self {
            data,
            pos: 0,
            dash_boundary,
            nl: b"\r\n",
            parts_read: 0,
            done: false,
        }
    }

    fn next_part(&mut self) -> Result<Option<(Headers, &'a [u8])>> {
        if self.dash_boundary.len() == 2 {
            return Err(Error::Enumeration("boundary is empty".to_string()));
        }

        let data: &'a [u8] = self.data;
        loop {
            if self.pos >= data.len() {
                return Err(Error::Enumeration(
                    "unexpected end of input before closing boundary".to_string(),
                ));
            }

            let rest = &data[self.pos..];
            let (line, complete) = rest
                .iter()
                .position(|&b| b == b'\n')
                .map_or((rest, false), |i| (&rest[..=i], true));
            self.pos += line.len();

            if self.is_final_boundary(line) {
                return Ok(None);
            }
            if !complete {
                return Err(Error::Enumeration(
                    "unexpected end of input before closing boundary".to_string(),
                ));
            }
            if self.is_delimiter_line(line) {
                self.parts_read += 1;
                return self.read_part().map(Some);
            }
            // Anything before the first delimiter is preamble.
            if self.parts_read > 0 {
                return Err(Error::Enumeration(format!(
                    "expected boundary delimiter, got line {:?}",
                    String::from_utf8_lossy(line)
                )));
            }
        }
    }

    /// Reads the headers and body of the part starting at `pos`, leaving
    /// `pos` at the next delimiter line.
    fn read_part(&mut self) -> Result<(Headers, &'a [u8])> {
        if self.pos >= self.data.len() {
            return Err(Error::Enumeration(
                "unexpected end of input after boundary delimiter".to_string(),
            ));
        }
        let (headers, consumed) = Headers::read(&self.data[self.pos..])?;
        self.pos += consumed;

        let data: &'a [u8] = self.data;
        let body_start = self.pos;
        let rest = &data[body_start..];

        // An empty body may be followed directly by the delimiter.
        if rest.starts_with(&self.dash_boundary)
            && matches_after_prefix(&rest[self.dash_boundary.len()..])
        {
            return Ok((headers, &rest[..0]));
        }

        let mut search = 0;
        loop {
            let Some(found) = self.find_nl_dash_boundary(&rest[search..]) else {
                return Err(Error::Enumeration(
                    "unexpected end of input inside part body".to_string(),
                ));
            };
            let at = search + found;
            let after = at + self.nl.len() + self.dash_boundary.len();
            if matches_after_prefix(&rest[after..]) {
                self.pos = body_start + at + self.nl.len();
                return Ok((headers, &rest[..at]));
            }
            search = at + 1;
        }
    }

    fn find_nl_dash_boundary(&self, haystack: &[u8]) -> Option<usize> {
        let needle_len = self.nl.len() + self.dash_boundary.len();
        haystack.windows(needle_len).position(|w| {
            w.starts_with(self.nl) && w[self.nl.len()..] == self.dash_boundary[..]
        })
    }

    fn is_delimiter_line(&mut self, line: &[u8]) -> bool {
        let Some(rest) = line.strip_prefix(&self.dash_boundary[..]) else {
            return false;
        };
        let rest = skip_lwsp(rest);
        if self.parts_read == 0 && rest == b"\n" {
            self.nl = b"\n";
            return true;
        }
        rest == self.nl
    }

    fn is_final_boundary(&self, line: &[u8]) -> bool {
        let Some(rest) = line
            .strip_prefix(&self.dash_boundary[..])
            .and_then(|r| r.strip_prefix(b"--"))
        else {
            return false;
        };
        let rest = skip_lwsp(rest);
        matches!(rest, b"" | b"\n" | b"\r\n")
    }
}

impl<'a> Iterator for Parts<'a> {
    type Item = Result<(Headers, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_part() {
            Ok(Some(part)) => Some(Ok(part)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Parts<'_> {}

/// Whether the bytes following a `--boundary` occurrence make it a real
/// delimiter rather than body text that merely starts the same way.
const fn matches_after_prefix(after: &[u8]) -> bool {
    matches!(
        after,
        [] | [b' ' | b'\t' | b'\r' | b'\n', ..] | [b'-', b'-', ..]
    )
}

fn skip_lwsp(mut s: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = s {
        s = rest;
    }
    s
}
