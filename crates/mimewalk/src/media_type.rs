//! Media type and parameter parsing (RFC 2045, RFC 2231).
//!
//! Used for both `Content-Type` and `Content-Disposition` values, which share
//! the same `token; name=value` grammar.

use crate::encoding::hex_value;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Characters that may not appear in a token (RFC 2045 `tspecials`).
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// A parsed media type such as `text/plain; charset=utf-8`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MediaType {
    value: String,
    params: HashMap<String, String>,
}

impl MediaType {
    /// The implicit `text/plain` type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self {
            value: "text/plain".to_string(),
            params: HashMap::new(),
        }
    }

    /// Lower-cased media type without parameters, e.g. `multipart/mixed`.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Main type (e.g., "text", "image", "multipart").
    #[must_use]
    pub fn main_type(&self) -> &str {
        self.value
            .split_once('/')
            .map_or(self.value.as_str(), |(main, _)| main)
    }

    /// Subtype (e.g., "plain", "html"), empty for single-token values.
    #[must_use]
    pub fn sub_type(&self) -> &str {
        self.value.split_once('/').map_or("", |(_, sub)| sub)
    }

    /// Looks up a parameter by lower-case name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All parameters, keyed by lower-case name.
    #[must_use]
    pub const fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// Returns the boundary parameter if present and non-empty.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary").filter(|b| !b.is_empty())
    }

    /// Checks if this is a `multipart/*` type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.value.starts_with("multipart/")
    }

    /// Parses a header value of the form `type/subtype; name=value; ...`.
    ///
    /// A bare `token` (as used by `Content-Disposition`) is accepted too.
    /// Parameter names are lower-cased; values may be tokens or quoted
    /// strings. RFC 2231 extended and continued parameters are reassembled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MediaTypeSyntax`] if the value is empty, the type is
    /// not a token pair, a parameter is malformed or unterminated, or a
    /// parameter name is repeated.
    pub fn parse(s: &str) -> Result<Self> {
        let (base, mut rest) = s.find(';').map_or((s, ""), |i| (&s[..i], &s[i..]));
        let value = base.trim().to_ascii_lowercase();
        check_type(&value)?;

        let mut params = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let Some((name, param_value, remaining)) = consume_param(rest) else {
                if rest.trim() == ";" {
                    break;
                }
                return Err(Error::MediaTypeSyntax(format!(
                    "invalid media parameter in {s:?}"
                )));
            };

            let map = match name.split_once('*') {
                Some((base_name, _)) => sections.entry(base_name.to_string()).or_default(),
                None => &mut params,
            };
            if map.contains_key(&name) {
                return Err(Error::MediaTypeSyntax(format!(
                    "duplicate parameter name {name:?}"
                )));
            }
            map.insert(name, param_value);
            rest = remaining;
        }

        for (name, pieces) in sections {
            if let Some(value) = assemble_extended(&name, &pieces) {
                params.insert(name, value);
            }
        }

        Ok(Self { value, params })
    }
}

fn check_type(value: &str) -> Result<()> {
    let (main, rest) = consume_token(value);
    if main.is_empty() {
        return Err(Error::MediaTypeSyntax("no media type".to_string()));
    }
    if rest.is_empty() {
        return Ok(());
    }
    let Some(rest) = rest.strip_prefix('/') else {
        return Err(Error::MediaTypeSyntax(format!(
            "expected slash after first token in {value:?}"
        )));
    };
    let (sub, rest) = consume_token(rest);
    if sub.is_empty() {
        return Err(Error::MediaTypeSyntax(format!(
            "expected token after slash in {value:?}"
        )));
    }
    if !rest.is_empty() {
        return Err(Error::MediaTypeSyntax(format!(
            "unexpected content after media subtype in {value:?}"
        )));
    }
    Ok(())
}

fn is_token_char(c: char) -> bool {
    c > ' ' && c < '\u{7f}' && !TSPECIALS.contains(c)
}

fn consume_token(v: &str) -> (&str, &str) {
    let end = v.find(|c| !is_token_char(c)).unwrap_or(v.len());
    v.split_at(end)
}

/// Consumes a token or quoted string. `None` if neither is present or the
/// quoted string is unterminated.
fn consume_value(v: &str) -> Option<(String, &str)> {
    let Some(quoted) = v.strip_prefix('"') else {
        let (token, rest) = consume_token(v);
        return (!token.is_empty()).then(|| (token.to_string(), rest));
    };

    let mut out = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &quoted[i + 1..])),
            '\\' => match quoted[i + 1..].chars().next() {
                Some(next) if TSPECIALS.contains(next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            },
            '\r' | '\n' => return None,
            _ => out.push(c),
        }
    }
    None
}

fn consume_param(v: &str) -> Option<(String, String, &str)> {
    let rest = v.trim_start().strip_prefix(';')?.trim_start();
    let (name, rest) = consume_token(rest);
    if name.is_empty() {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let (value, rest) = consume_value(rest)?;
    Some((name.to_ascii_lowercase(), value, rest))
}

/// Reassembles `name*`, `name*0`, `name*1*`, ... into one value.
fn assemble_extended(name: &str, pieces: &HashMap<String, String>) -> Option<String> {
    if let Some(v) = pieces.get(&format!("{name}*")) {
        return decode_extended(v);
    }

    let mut out = String::new();
    let mut found = false;
    for n in 0.. {
        let simple = format!("{name}*{n}");
        if let Some(v) = pieces.get(&simple) {
            found = true;
            out.push_str(v);
            continue;
        }
        let Some(v) = pieces.get(&format!("{simple}*")) else {
            break;
        };
        found = true;
        if n == 0 {
            if let Some(decoded) = decode_extended(v) {
                out.push_str(&decoded);
            }
        } else if let Some(decoded) = percent_decode(v) {
            out.push_str(&decoded);
        }
    }
    found.then_some(out)
}

/// Decodes `charset'language'percent-encoded`. Only UTF-8 and US-ASCII are
/// understood.
fn decode_extended(v: &str) -> Option<String> {
    let mut fields = v.splitn(3, '\'');
    let charset = fields.next()?.to_ascii_lowercase();
    let _language = fields.next()?;
    let encoded = fields.next()?;
    if charset != "us-ascii" && charset != "utf-8" {
        return None;
    }
    percent_decode(encoded)
}

fn percent_decode(v: &str) -> Option<String> {
    let bytes = v.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            out.push((hex_value(hex[0])? << 4) | hex_value(hex[1])?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}
