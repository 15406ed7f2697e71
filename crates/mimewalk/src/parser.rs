//! Multipart tree construction.
//!
//! The document is read into memory once; each nested multipart section is
//! then parsed from a sub-slice of that buffer, depth first and in document
//! order.

use crate::config::ParseOptions;
use crate::encoding;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::media_type::MediaType;
use crate::metadata::{self, PartMetadata};
use crate::multipart::Parts;
use crate::part::{MimeTree, NewPart, PartId};
use std::io::Read;
use tracing::debug;

const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_DISPOSITION: &str = "Content-Disposition";
const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";

/// Parses a MIME document with default options.
///
/// # Errors
///
/// Returns an error if reading fails or the document is malformed anywhere;
/// no partial tree is produced.
pub fn parse(reader: impl Read) -> Result<MimeTree> {
    parse_with(reader, &ParseOptions::default())
}

/// Parses a MIME document with explicit options.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_with(mut reader: impl Read, options: &ParseOptions) -> Result<MimeTree> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_bytes_with(&data, options)
}

/// Parses an in-memory MIME document with default options.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_bytes(data: &[u8]) -> Result<MimeTree> {
    parse_bytes_with(data, &ParseOptions::default())
}

/// Parses an in-memory MIME document with explicit options.
///
/// # Errors
///
/// Returns [`Error::HeaderRead`] for an unreadable header block,
/// [`Error::MediaTypeSyntax`] for a bad or missing `Content-Type`,
/// [`Error::MissingBoundary`] for a multipart part without boundary,
/// [`Error::Enumeration`] for broken boundary framing,
/// [`Error::NestingTooDeep`] past [`ParseOptions::max_depth`], or a decode
/// error for a body that does not match its transfer encoding.
pub fn parse_bytes_with(data: &[u8], options: &ParseOptions) -> Result<MimeTree> {
    let (header, consumed) = Headers::read(data)?;
    let body = &data[consumed..];

    let meta = resolve_metadata(&header, options)?;
    let boundary = container_boundary(&meta)?;
    let encoding = header.get(CONTENT_TRANSFER_ENCODING).map(str::to_string);

    debug!(
        content_type = meta.media_type.value(),
        len = data.len(),
        "parsing MIME document"
    );

    let mut tree = MimeTree::with_root(new_part(header, meta));
    let mut builder = Builder {
        tree: &mut tree,
        options,
    };
    match boundary {
        Some(boundary) => builder.parse_children(PartId::ROOT, body, &boundary, 1)?,
        None => {
            let content = encoding::decode(encoding.as_deref(), body)?;
            builder.tree.set_content(PartId::ROOT, content);
        }
    }

    debug!(parts = tree.len(), "MIME tree built");
    Ok(tree)
}

struct Builder<'t, 'o> {
    tree: &'t mut MimeTree,
    options: &'o ParseOptions,
}

impl Builder<'_, '_> {
    /// Adds every part of `body` as a child of `parent`, recursing into
    /// nested multiparts. `depth` is the depth of the children.
    fn parse_children(
        &mut self,
        parent: PartId,
        body: &[u8],
        boundary: &str,
        depth: usize,
    ) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::NestingTooDeep {
                depth,
                max: self.options.max_depth,
            });
        }

        let mut prev_sibling = None;
        for part in Parts::new(body, boundary) {
            let (header, part_body) = part?;

            let meta = resolve_metadata(&header, self.options)?;
            let nested = container_boundary(&meta)?;
            let encoding = header.get(CONTENT_TRANSFER_ENCODING).map(str::to_string);

            debug!(
                depth,
                content_type = meta.media_type.value(),
                disposition = %meta.disposition,
                file_name = %meta.file_name,
                "MIME part"
            );

            let id = self
                .tree
                .push_child(parent, prev_sibling, new_part(header, meta));
            prev_sibling = Some(id);

            match nested {
                Some(nested) => self.parse_children(id, part_body, &nested, depth + 1)?,
                None => {
                    let content = encoding::decode(encoding.as_deref(), part_body)?;
                    self.tree.set_content(id, content);
                }
            }
        }

        Ok(())
    }
}

fn resolve_metadata(header: &Headers, options: &ParseOptions) -> Result<PartMetadata> {
    let disposition = header.get(CONTENT_DISPOSITION);
    match header.get(CONTENT_TYPE) {
        None if options.implicit_content_type => {
            Ok(metadata::resolve_with(MediaType::text_plain(), disposition))
        }
        content_type => metadata::resolve(content_type, disposition),
    }
}

/// Boundary of a multipart part, `None` for leaves.
fn container_boundary(meta: &PartMetadata) -> Result<Option<String>> {
    if !meta.media_type.is_multipart() {
        return Ok(None);
    }
    meta.media_type
        .boundary()
        .map(|b| Some(b.to_string()))
        .ok_or(Error::MissingBoundary)
}

fn new_part(header: Headers, meta: PartMetadata) -> NewPart {
    NewPart {
        header,
        content_type: meta.media_type.value().to_string(),
        disposition: meta.disposition,
        file_name: meta.file_name,
    }
}
