//! Per-part metadata resolution.

use crate::error::{Error, Result};
use crate::media_type::MediaType;

/// How the `Content-Disposition` header was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispositionStatus {
    /// Header present and parsed.
    Parsed,
    /// No header.
    Absent,
    /// Header present but unparseable; ignored.
    Malformed(String),
}

/// Content type, disposition and file name of a part.
#[derive(Debug, Clone)]
pub struct PartMetadata {
    /// Parsed `Content-Type`, parameters included.
    pub media_type: MediaType,
    /// Lower-cased disposition token, empty when absent or malformed.
    pub disposition: String,
    /// Outcome of the disposition parse.
    pub disposition_status: DispositionStatus,
    /// Resolved file name, empty when none was given.
    pub file_name: String,
}

/// Resolves a part's metadata from its raw header values.
///
/// The file name comes from the disposition's `filename` parameter, falling
/// back to the content type's `name` parameter.
///
/// # Errors
///
/// Returns [`Error::MediaTypeSyntax`] if the content type is absent or does
/// not parse. Disposition problems never fail.
pub fn resolve(content_type: Option<&str>, disposition: Option<&str>) -> Result<PartMetadata> {
    let media_type = content_type
        .ok_or_else(|| Error::MediaTypeSyntax("no media type".to_string()))
        .and_then(MediaType::parse)?;
    Ok(resolve_with(media_type, disposition))
}

/// Like [`resolve`], for an already parsed content type.
#[must_use]
pub fn resolve_with(media_type: MediaType, disposition: Option<&str>) -> PartMetadata {
    let parsed = disposition.map(MediaType::parse);

    let (disposition, disposition_status, filename) = match parsed {
        None => (String::new(), DispositionStatus::Absent, None),
        Some(Ok(d)) => {
            let filename = d.param("filename").map(str::to_string);
            (d.value().to_string(), DispositionStatus::Parsed, filename)
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "ignoring malformed Content-Disposition");
            (String::new(), DispositionStatus::Malformed(e.to_string()), None)
        }
    };

    let file_name = filename
        .filter(|f| !f.is_empty())
        .or_else(|| media_type.param("name").map(str::to_string))
        .unwrap_or_default();

    PartMetadata {
        media_type,
        disposition,
        disposition_status,
        file_name,
    }
}
