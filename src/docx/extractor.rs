//! Block extraction
//!
//! Walks a loaded document in a fixed order and produces addressable text
//! blocks:
//!
//! 1. body paragraphs, including those inside block-level content controls
//! 2. body tables, row-major then cell-major, recursing into nested tables
//! 3. per section, its headers then its footers
//!
//! Block ids are built from structural ordinals only (`body/p3`,
//! `body/tbl0/r1/c2/p0`, `sect0/header.default/p1`), so re-extracting an
//! unmodified document yields the same ids.

use super::document::{DocxDocument, ElementHandle, SectionPart};
use super::runs::RunIndex;
use super::xml::XmlElement;
use crate::domain::errors::DocumentError;
use crate::domain::ids::BlockId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where a block lives in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    TableCell,
    Header,
    Footer,
    StructuredContent,
}

/// An addressable unit of document text
#[derive(Debug, Clone)]
pub struct Block {
    /// Structural id, stable across loads of the same document
    pub block_id: BlockId,
    /// Normalized paragraph text
    pub text: String,
    pub block_type: BlockType,
    /// Handle to the paragraph element, valid for this load only
    pub element: ElementHandle,
    /// Reverse index from `text` offsets onto runs
    pub run_index: RunIndex,
}

/// A block that could not be read
#[derive(Debug, Clone, Serialize)]
pub struct SkippedBlock {
    pub block_id: BlockId,
    pub reason: String,
}

/// Result of one extraction pass
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub blocks: Vec<Block>,
    pub skipped: Vec<SkippedBlock>,
}

impl Extraction {
    /// Looks up a block by id
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.block_id == id)
    }
}

/// Extracts all non-empty text blocks from a document.
///
/// Unreadable paragraphs are skipped and reported in
/// [`Extraction::skipped`]; only a missing body is an error.
pub fn extract(doc: &DocxDocument) -> Result<Extraction, DocumentError> {
    let (body_index, body) = doc.body()?;
    let body_id = BlockId::root("body");

    let mut walker = Walker {
        part: 0,
        out: Extraction::default(),
    };

    let mut path = vec![body_index];
    walker.paragraphs(
        body,
        &mut path,
        &body_id,
        BlockType::Paragraph,
        BlockType::StructuredContent,
    );
    walker.tables(body, &mut path, &body_id, BlockType::TableCell, BlockType::StructuredContent);

    for (s, section) in doc.sections().iter().enumerate() {
        for (label, refs, block_type) in [
            ("header", &section.headers, BlockType::Header),
            ("footer", &section.footers, BlockType::Footer),
        ] {
            for SectionPart {
                reference_type,
                part,
            } in refs
            {
                let root = &doc.parts()[*part].xml.root;
                let id = BlockId::root(format!("sect{s}/{label}.{reference_type}"));
                walker.part = *part;
                let mut path = Vec::new();
                walker.paragraphs(root, &mut path, &id, block_type, block_type);
                walker.tables(root, &mut path, &id, block_type, block_type);
            }
        }
    }

    let out = walker.out;
    debug!(
        blocks = out.blocks.len(),
        skipped = out.skipped.len(),
        "Extracted blocks"
    );
    Ok(out)
}

struct Walker {
    part: usize,
    out: Extraction,
}

impl Walker {
    /// Paragraphs directly in `container` and in its content controls
    fn paragraphs(
        &mut self,
        container: &XmlElement,
        path: &mut Vec<usize>,
        id: &BlockId,
        block_type: BlockType,
        sdt_type: BlockType,
    ) {
        let (mut p, mut s) = (0, 0);
        for (i, child) in container.child_elements() {
            path.push(i);
            match child.name.as_str() {
                "w:p" => {
                    self.paragraph(child, path, id.child(format!("p{p}")), block_type);
                    p += 1;
                }
                "w:sdt" => {
                    if let Some((ci, content)) = sdt_content(child) {
                        path.push(ci);
                        self.paragraphs(content, path, &id.child(format!("sdt{s}")), sdt_type, sdt_type);
                        path.pop();
                    }
                    s += 1;
                }
                _ => {}
            }
            path.pop();
        }
    }

    /// Tables directly in `container` and in its content controls
    fn tables(
        &mut self,
        container: &XmlElement,
        path: &mut Vec<usize>,
        id: &BlockId,
        cell_type: BlockType,
        sdt_type: BlockType,
    ) {
        let (mut t, mut s) = (0, 0);
        for (i, child) in container.child_elements() {
            path.push(i);
            match child.name.as_str() {
                "w:tbl" => {
                    self.table(child, path, &id.child(format!("tbl{t}")), cell_type, sdt_type);
                    t += 1;
                }
                "w:sdt" => {
                    if let Some((ci, content)) = sdt_content(child) {
                        path.push(ci);
                        self.tables(content, path, &id.child(format!("sdt{s}")), cell_type, sdt_type);
                        path.pop();
                    }
                    s += 1;
                }
                _ => {}
            }
            path.pop();
        }
    }

    fn table(
        &mut self,
        table: &XmlElement,
        path: &mut Vec<usize>,
        id: &BlockId,
        cell_type: BlockType,
        sdt_type: BlockType,
    ) {
        for (r, (ri, row)) in table
            .child_elements()
            .filter(|(_, el)| el.is("w:tr"))
            .enumerate()
        {
            path.push(ri);
            for (c, (ci, cell)) in row
                .child_elements()
                .filter(|(_, el)| el.is("w:tc"))
                .enumerate()
            {
                path.push(ci);
                let cell_id = id.child(format!("r{r}")).child(format!("c{c}"));
                self.paragraphs(cell, path, &cell_id, cell_type, sdt_type);
                self.tables(cell, path, &cell_id, cell_type, sdt_type);
                path.pop();
            }
            path.pop();
        }
    }

    fn paragraph(
        &mut self,
        paragraph: &XmlElement,
        path: &[usize],
        block_id: BlockId,
        block_type: BlockType,
    ) {
        match RunIndex::build(paragraph) {
            Ok(run_index) => {
                if run_index.text().trim().is_empty() {
                    return;
                }
                self.out.blocks.push(Block {
                    text: run_index.text().to_string(),
                    block_id,
                    block_type,
                    element: ElementHandle {
                        part: self.part,
                        path: path.to_vec(),
                    },
                    run_index,
                });
            }
            Err(reason) => {
                warn!(block_id = %block_id, reason = %reason, "Skipping unreadable block");
                self.out.skipped.push(SkippedBlock { block_id, reason });
            }
        }
    }
}

fn sdt_content(sdt: &XmlElement) -> Option<(usize, &XmlElement)> {
    sdt.child_elements().find(|(_, el)| el.is("w:sdtContent"))
}
