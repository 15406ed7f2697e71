//! # mimewalk
//!
//! Parses a raw MIME document (RFC 2045/2046) into a tree of typed, decoded
//! parts.
//!
//! ## Features
//!
//! - **Tree building**: nested multipart sections become parent/child/sibling
//!   links, in document order
//! - **Decoding**: Base64 (tolerant of line wrapping and stray bytes) and
//!   Quoted-Printable bodies are decoded to raw bytes
//! - **Metadata**: content type, disposition and file name per part, with
//!   `filename` taking precedence over the legacy `name` parameter
//! - **Strictness**: any malformed part fails the whole document; only a bad
//!   `Content-Disposition` is tolerated
//!
//! ## Quick Start
//!
//! ```
//! use mimewalk::MimePart;
//!
//! let raw = concat!(
//!     "Content-Type: multipart/mixed; boundary=frontier\r\n",
//!     "\r\n",
//!     "--frontier\r\n",
//!     "Content-Type: text/plain\r\n",
//!     "\r\n",
//!     "Hello, World!\r\n",
//!     "--frontier\r\n",
//!     "Content-Type: application/octet-stream\r\n",
//!     "Content-Disposition: attachment; filename=\"hello.bin\"\r\n",
//!     "Content-Transfer-Encoding: base64\r\n",
//!     "\r\n",
//!     "AAEC\r\n",
//!     "--frontier--\r\n",
//! );
//!
//! let tree = mimewalk::parse_bytes(raw.as_bytes())?;
//! let root = tree.root();
//! assert_eq!(root.content_type(), "multipart/mixed");
//!
//! let text = root.first_child().unwrap();
//! assert_eq!(text.content(), b"Hello, World!");
//!
//! let attachment = text.next_sibling().unwrap();
//! assert_eq!(attachment.file_name(), "hello.bin");
//! assert_eq!(attachment.content(), b"\x00\x01\x02");
//! # Ok::<(), mimewalk::Error>(())
//! ```
//!
//! ### Options
//!
//! ```
//! use mimewalk::{MimePart, ParseOptions};
//!
//! let options = ParseOptions::builder()
//!     .max_depth(8)
//!     .implicit_content_type(true)
//!     .build();
//!
//! let tree = mimewalk::parse_bytes_with(b"Subject: hi\r\n\r\nbody", &options)?;
//! assert_eq!(tree.root().content_type(), "text/plain");
//! # Ok::<(), mimewalk::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod header;
mod media_type;
mod parser;
mod part;

pub mod encoding;
pub mod metadata;
pub mod multipart;

pub use config::{DEFAULT_MAX_DEPTH, ParseOptions, ParseOptionsBuilder};
pub use error::{Error, Result};
pub use header::Headers;
pub use media_type::MediaType;
pub use metadata::{DispositionStatus, PartMetadata};
pub use parser::{parse, parse_bytes, parse_bytes_with, parse_with};
pub use part::{MimePart, MimeTree, PartId, PartRef};
