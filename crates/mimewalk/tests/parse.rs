//! End-to-end tests for MIME tree construction.

#![allow(clippy::unwrap_used)]

use mimewalk::{Error, MimePart, MimeTree, ParseOptions, PartRef};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn parse(doc: &str) -> mimewalk::Result<MimeTree> {
    init_tracing();
    mimewalk::parse(doc.as_bytes())
}

fn child(part: PartRef<'_>, n: usize) -> PartRef<'_> {
    part.children().nth(n).unwrap()
}

#[test]
fn test_single_part_quoted_printable() {
    let tree = parse(concat!(
        "From: sender@example.com\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "Caf=C3=A9"
    ))
    .unwrap();

    let root = tree.root();
    assert_eq!(root.first_child(), None);
    assert_eq!(root.content(), "Café".as_bytes());
    assert_eq!(root.header().get("from"), Some("sender@example.com"));
}

#[test]
fn test_single_part_passthrough_keeps_bytes() {
    let tree = parse(concat!(
        "Content-Type: text/plain\r\n",
        "\r\n",
        "line one\r\n",
        "line =41 two\r\n"
    ))
    .unwrap();
    assert_eq!(tree.root().content(), b"line one\r\nline =41 two\r\n");
}

#[test]
fn test_top_level_parts_in_document_order() {
    let tree = parse(concat!(
        "Content-Type: multipart/mixed; boundary=\"sep\"\r\n",
        "\r\n",
        "preamble\r\n",
        "--sep\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "first\r\n",
        "--sep\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>second</p>\r\n",
        "--sep\r\n",
        "Content-Type: image/png\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "iVBO\r\n",
        "Rw==\r\n",
        "--sep--\r\n",
        "epilogue\r\n"
    ))
    .unwrap();

    let root = tree.root();
    let types: Vec<&str> = root.children().map(MimePart::content_type).collect();
    assert_eq!(types, vec!["text/plain", "text/html", "image/png"]);
    assert!(root.content().is_empty());

    for part in root.children() {
        assert_eq!(part.parent(), Some(root));
        assert_eq!(part.first_child(), None);
    }
    assert_eq!(child(root, 0).content(), b"first");
    assert_eq!(child(root, 2).content(), b"\x89PNG");
    assert_eq!(child(root, 2).next_sibling(), None);
}

#[test]
fn test_file_name_precedence() {
    let tree = parse(concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/plain; name=\"b.txt\"\r\n",
        "Content-Disposition: attachment; filename=\"a.txt\"\r\n",
        "\r\n",
        "both\r\n",
        "--b\r\n",
        "Content-Type: text/plain; name=\"b.txt\"\r\n",
        "\r\n",
        "name only\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "neither\r\n",
        "--b--\r\n"
    ))
    .unwrap();

    let names: Vec<&str> = tree.root().children().map(MimePart::file_name).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", ""]);
    assert_eq!(child(tree.root(), 0).disposition(), "attachment");
    assert_eq!(child(tree.root(), 1).disposition(), "");
}

#[test]
fn test_malformed_disposition_is_tolerated() {
    let tree = parse(concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: application/pdf; name=report.pdf\r\n",
        "Content-Disposition: attachment; filename=\"oops\r\n",
        "\r\n",
        "%PDF\r\n",
        "--b--\r\n"
    ))
    .unwrap();

    let part = child(tree.root(), 0);
    assert_eq!(part.disposition(), "");
    assert_eq!(part.file_name(), "report.pdf");
    assert_eq!(part.content(), b"%PDF");
}

#[test]
fn test_nested_multipart() {
    let tree = parse(concat!(
        "Content-Type: multipart/mixed; boundary=\"A\"\r\n",
        "\r\n",
        "--A\r\n",
        "Content-Type: multipart/alternative; boundary=\"B\"\r\n",
        "\r\n",
        "--B\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "plain body\r\n",
        "--B\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>html body</p>\r\n",
        "--B--\r\n",
        "--A--\r\n"
    ))
    .unwrap();

    let root = tree.root();
    assert_eq!(root.children().count(), 1);

    let alt = child(root, 0);
    assert_eq!(alt.content_type(), "multipart/alternative");
    assert!(alt.content().is_empty());
    assert_eq!(alt.children().count(), 2);

    let plain = child(alt, 0);
    let html = child(alt, 1);
    assert_eq!(plain.content(), b"plain body");
    assert_eq!(html.content(), b"<p>html body</p>");
    assert_eq!(html.parent(), Some(alt));
    assert_eq!(html.depth(), 2);

    let max_depth = tree.iter().map(MimePart::depth).max().unwrap();
    assert_eq!(max_depth + 1, 3);
    assert_eq!(tree.len(), 4);
}

#[test]
fn test_inner_boundary_text_in_outer_leaf() {
    let tree = parse(concat!(
        "Content-Type: multipart/mixed; boundary=\"A\"\r\n",
        "\r\n",
        "--A\r\n",
        "Content-Type: multipart/alternative; boundary=\"B\"\r\n",
        "\r\n",
        "--B\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "inner\r\n",
        "--B--\r\n",
        "--A\r\n",
        "Content-Type: text/plain\r\n",
        "Content-Disposition: attachment; filename=\"notes.txt\"\r\n",
        "\r\n",
        "this text mentions\r\n",
        "--B\r\n",
        "but it is not a delimiter here\r\n",
        "--A--\r\n"
    ))
    .unwrap();

    let root = tree.root();
    assert_eq!(root.children().count(), 2);

    let alt = child(root, 0);
    assert_eq!(alt.children().count(), 1);

    let notes = child(root, 1);
    assert_eq!(notes.file_name(), "notes.txt");
    assert_eq!(notes.first_child(), None);
    assert_eq!(
        notes.content(),
        b"this text mentions\r\n--B\r\nbut it is not a delimiter here"
    );
    assert_eq!(tree.attachments(), vec![notes]);
}

#[test]
fn test_bare_lf_document() {
    let tree = parse(concat!(
        "Content-Type: multipart/alternative; boundary=x\n",
        "\n",
        "--x\n",
        "Content-Type: text/plain\n",
        "Content-Transfer-Encoding: quoted-printable\n",
        "\n",
        "soft=\n",
        "break\n",
        "--x--\n"
    ))
    .unwrap();
    assert_eq!(child(tree.root(), 0).content(), b"softbreak");
}

#[test]
fn test_malformed_content_type_fails() {
    let err = parse(concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/plain; charset=\"unterminated\r\n",
        "\r\n",
        "body\r\n",
        "--b--\r\n"
    ))
    .unwrap_err();
    assert!(matches!(err, Error::MediaTypeSyntax(_)));

    let err = parse("Content-Type: text/plain; charset=\"unterminated\r\n\r\nbody").unwrap_err();
    assert!(matches!(err, Error::MediaTypeSyntax(_)));
}

#[test]
fn test_spaced_media_type_fails() {
    let err = parse(concat!(
        "Content-Type: multipart / mixed; boundary=x\r\n",
        "\r\n",
        "--x\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "body\r\n",
        "--x--\r\n"
    ))
    .unwrap_err();
    assert!(matches!(err, Error::MediaTypeSyntax(_)));

    let err = parse(concat!(
        "Content-Type: multipart/mixed; boundary=x\r\n",
        "\r\n",
        "--x\r\n",
        "Content-Type: text /plain\r\n",
        "\r\n",
        "body\r\n",
        "--x--\r\n"
    ))
    .unwrap_err();
    assert!(matches!(err, Error::MediaTypeSyntax(_)));
}

#[test]
fn test_repeated_parameter_fails() {
    let err = parse(concat!(
        "Content-Type: multipart/mixed; boundary=x; boundary=x\r\n",
        "\r\n",
        "--x--\r\n"
    ))
    .unwrap_err();
    assert!(matches!(err, Error::MediaTypeSyntax(_)));
}

#[test]
fn test_nested_missing_boundary_fails() {
    let err = parse(concat!(
        "Content-Type: multipart/mixed; boundary=outer\r\n",
        "\r\n",
        "--outer\r\n",
        "Content-Type: multipart/mixed\r\n",
        "\r\n",
        "orphan\r\n",
        "--outer--\r\n"
    ))
    .unwrap_err();
    assert!(matches!(err, Error::MissingBoundary));
}

#[test]
fn test_decode_failure_aborts_parse() {
    let err = parse(concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "fine\r\n",
        "--b\r\n",
        "Content-Type: application/octet-stream\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "QUJD\r\n",
        "RA\r\n",
        "--b--\r\n"
    ))
    .unwrap_err();
    assert!(err.is_decode());
}

#[test]
fn test_truncated_multipart_fails() {
    let err = parse(concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "cut off mid-part"
    ))
    .unwrap_err();
    assert!(matches!(err, Error::Enumeration(_)));
}

#[test]
fn test_input_ending_after_delimiter_fails() {
    let err = parse(concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "first\r\n",
        "--b\r\n"
    ))
    .unwrap_err();
    assert!(matches!(err, Error::Enumeration(_)));
}

#[test]
fn test_truncated_header_fails() {
    let err = parse("Content-Type: text/plain\r\n").unwrap_err();
    assert!(matches!(err, Error::HeaderRead(_)));
}

#[test]
fn test_missing_part_content_type_with_implicit_option() {
    let doc = concat!(
        "Content-Type: multipart/mixed; boundary=b\r\n",
        "\r\n",
        "--b\r\n",
        "\r\n",
        "no headers at all\r\n",
        "--b--\r\n"
    );
    assert!(matches!(
        parse(doc).unwrap_err(),
        Error::MediaTypeSyntax(_)
    ));

    let options = ParseOptions::builder().implicit_content_type(true).build();
    let tree = mimewalk::parse_bytes_with(doc.as_bytes(), &options).unwrap();
    let part = child(tree.root(), 0);
    assert_eq!(part.content_type(), "text/plain");
    assert_eq!(part.content(), b"no headers at all");
}

#[test]
fn test_breadth_first_prefers_shallow_body() {
    let tree = parse(concat!(
        "Content-Type: multipart/mixed; boundary=o\r\n",
        "\r\n",
        "--o\r\n",
        "Content-Type: multipart/related; boundary=i\r\n",
        "\r\n",
        "--i\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "nested\r\n",
        "--i--\r\n",
        "--o\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "shallow\r\n",
        "--o--\r\n"
    ))
    .unwrap();

    let is_text = |p: PartRef<'_>| p.content_type() == "text/plain";
    assert_eq!(tree.breadth_first_match(is_text).unwrap().content(), b"shallow");
    assert_eq!(tree.depth_first_match(is_text).unwrap().content(), b"nested");
}
