//! DOCX document model
//!
//! - [`package`]: zip container I/O
//! - [`xml`]: owned XML tree over `quick-xml`
//! - [`document`]: parsed parts, sections, element handles
//! - [`runs`]: paragraph text, reverse run index, in-place span edits
//! - [`extractor`]: ordered block extraction with structural ids

pub mod document;
pub mod extractor;
pub mod package;
pub mod runs;
pub mod xml;

pub use document::{DocxDocument, ElementHandle};
pub use extractor::{extract, Block, BlockType, Extraction, SkippedBlock};
pub use runs::{replace_span, RunIndex, SpanEditError};

#[cfg(test)]
pub(crate) mod testing {
    use super::document::MAIN_PART;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    pub const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    /// Single-run paragraph
    pub fn p(text: &str) -> String {
        format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
    }

    /// Package with the given body content plus extra parts
    pub fn docx_bytes(body: &str, extra: &[(&str, String)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        zip.start_file(MAIN_PART, opts).unwrap();
        write!(zip, "<w:document {NS}><w:body>{body}</w:body></w:document>").unwrap();
        for (name, data) in extra {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}
