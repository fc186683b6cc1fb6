//! End-to-end tests: transcript JSON in, document bytes out.

use std::io::{Cursor, Read};

use chatdoc::{Config, ExportFormat, ExportOptions, Message, Role, export, parse_transcript};
use zip::ZipArchive;

const TRANSCRIPT: &str = r#"{
    "title": "Deploy review",
    "messages": [
        { "role": "user", "content": "How do I *restart* the service?", "timestamp": "2025-03-01T09:30:00Z" },
        { "role": "assistant", "content": [
            { "type": "text", "text": "Run this:\n\n```bash\nsystemctl restart app\n```" },
            { "type": "text", "text": "Then check:\n\n1. **status**\n2. `logs`" }
        ] },
        { "role": "assistant", "content": { "unexpected": true } }
    ]
}"#;

fn options() -> ExportOptions {
    ExportOptions {
        title: "Deploy review".to_string(),
        ..Default::default()
    }
}

fn archive_part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut part = archive.by_name(name).expect("part present");
    let mut xml = String::new();
    part.read_to_string(&mut xml).expect("utf-8 part");
    xml
}

#[test]
fn transcript_file_parses() {
    let transcript = parse_transcript(TRANSCRIPT).expect("valid transcript");
    assert_eq!(transcript.title(), Some("Deploy review"));

    let roles: Vec<Role> = transcript.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Assistant]);
    assert!(transcript.messages()[0].timestamp.is_some());
}

#[test]
fn bare_message_array_parses() {
    let transcript =
        parse_transcript(r#"[{"role": "user", "content": "hi"}]"#).expect("valid transcript");
    assert_eq!(transcript.title(), None);
    assert_eq!(transcript.messages().len(), 1);
}

#[test]
fn docx_package_has_all_parts() {
    let transcript = parse_transcript(TRANSCRIPT).unwrap();
    let docx = export(
        transcript.messages(),
        ExportFormat::Docx,
        &options(),
        &Config::default(),
    )
    .unwrap();

    assert_eq!(docx.format, ExportFormat::Docx);
    assert!(docx.bytes.starts_with(b"PK"));

    let mut archive = ZipArchive::new(Cursor::new(&docx.bytes[..])).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    for expected in [
        "[Content_Types].xml",
        "_rels/.rels",
        "docProps/app.xml",
        "docProps/core.xml",
        "word/_rels/document.xml.rels",
        "word/document.xml",
        "word/footer1.xml",
        "word/header1.xml",
        "word/numbering.xml",
        "word/styles.xml",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
    assert!(archive.by_name("word/document.xml").is_ok());
}

#[test]
fn docx_body_carries_labels_and_content() {
    let transcript = parse_transcript(TRANSCRIPT).unwrap();
    let docx = export(
        transcript.messages(),
        ExportFormat::Docx,
        &options(),
        &Config::default(),
    )
    .unwrap();

    let body = archive_part(&docx.bytes, "word/document.xml");
    assert!(body.contains("Deploy review"));
    assert!(body.contains(">User<"));
    assert!(body.contains(">Assistant<"));
    assert!(body.contains("systemctl restart app"));
    assert!(body.contains("restart"));
    // The object-shaped content has no text and is skipped
    assert_eq!(body.matches(">Assistant<").count(), 1);

    let core = archive_part(&docx.bytes, "docProps/core.xml");
    assert!(core.contains("<dc:title>Deploy review</dc:title>"));
    assert!(core.contains("<dc:creator>Meridian Labs</dc:creator>"));
}

#[test]
fn pdf_export_produces_pdf() {
    let messages = vec![
        Message::user("Hello"),
        Message::assistant("# Answer\n\n**Hi** there, see `code`.\n\n> quoted"),
    ];
    let pdf = export(&messages, ExportFormat::Pdf, &options(), &Config::default()).unwrap();

    assert_eq!(pdf.mime_type(), "application/pdf");
    assert!(pdf.bytes.starts_with(b"%PDF"));
}

#[test]
fn long_transcripts_paginate() {
    let paragraph = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(20);
    let messages: Vec<Message> = (0..20)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(paragraph.as_str())
            } else {
                Message::assistant(paragraph.as_str())
            }
        })
        .collect();

    let markup = chatdoc::transcript_to_typst(&messages, &options(), &Config::default()).unwrap();
    let pages = markup.matches("#pagebreak()").count() + 1;
    assert!(pages > 2, "expected several pages, got {pages}");
    assert!(markup.contains(&format!("\"Page {pages} of {pages}\"")));

    let pdf = chatdoc::render_pdf(&messages, &options(), &Config::default()).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn custom_branding_reaches_both_formats() {
    let mut config = Config::default();
    config.brand.organization = "Acme & Co".to_string();
    config.brand.user_label = "Customer".to_string();
    let messages = vec![Message::user("ping"), Message::assistant("pong")];

    let docx = export(&messages, ExportFormat::Docx, &options(), &config).unwrap();
    let header = archive_part(&docx.bytes, "word/header1.xml");
    assert!(header.contains("Acme &amp; Co"));
    assert!(archive_part(&docx.bytes, "word/document.xml").contains(">Customer<"));

    let markup = chatdoc::transcript_to_typst(&messages, &options(), &config).unwrap();
    assert!(markup.contains("\"Acme & Co\""));
    assert!(markup.contains("\"Customer\""));
}
