//! Shared fixtures for integration tests

#![allow(dead_code)]

use docanon::docx::{extract, DocxDocument};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

pub const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

pub const RELS_PART: &str = "word/_rels/document.xml.rels";

/// Single-run paragraph
pub fn p(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

/// Table with one single-paragraph cell per row
pub fn table(rows: &[&str]) -> String {
    let rows: String = rows
        .iter()
        .map(|text| format!("<w:tr><w:tc>{}</w:tc></w:tr>", p(text)))
        .collect();
    format!("<w:tbl>{rows}</w:tbl>")
}

/// Package with the given body content plus extra parts
pub fn docx_bytes(body: &str, extra: &[(&str, String)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();
    zip.start_file("word/document.xml", opts).unwrap();
    write!(zip, "<w:document {NS}><w:body>{body}</w:body></w:document>").unwrap();
    for (name, data) in extra {
        zip.start_file(*name, opts).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Package with a default header part holding `header_text`
pub fn docx_with_header(body: &str, header_text: &str) -> Vec<u8> {
    let body = format!(
        r#"{body}<w:sectPr><w:headerReference w:type="default" r:id="rId1"/></w:sectPr>"#
    );
    let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/></Relationships>"#;
    docx_bytes(
        &body,
        &[
            (RELS_PART, rels.to_string()),
            (
                "word/header1.xml",
                format!("<w:hdr {NS}>{}</w:hdr>", p(header_text)),
            ),
        ],
    )
}

/// Block texts in extraction order
pub fn block_texts(bytes: &[u8]) -> Vec<String> {
    let doc = DocxDocument::open(bytes).unwrap();
    extract(&doc)
        .unwrap()
        .blocks
        .into_iter()
        .map(|b| b.text)
        .collect()
}

/// Block ids in extraction order
pub fn block_ids(bytes: &[u8]) -> Vec<String> {
    let doc = DocxDocument::open(bytes).unwrap();
    extract(&doc)
        .unwrap()
        .blocks
        .into_iter()
        .map(|b| b.block_id.to_string())
        .collect()
}
