//! Loaded DOCX document: parsed parts, sections and element handles

use super::package::DocxPackage;
use super::xml::{XmlDocument, XmlElement};
use crate::domain::errors::DocumentError;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Main document part
pub const MAIN_PART: &str = "word/document.xml";

/// Relationships of the main document part
pub const MAIN_RELS: &str = "word/_rels/document.xml.rels";

/// Role of a parsed part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Main,
    Header,
    Footer,
}

/// A parsed XML part of the package
#[derive(Debug, Clone)]
pub struct XmlPart {
    pub name: String,
    pub kind: PartKind,
    pub xml: XmlDocument,
    dirty: bool,
}

/// Header or footer attached to a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPart {
    /// `w:type` of the reference (`default`, `first`, `even`)
    pub reference_type: String,
    /// Index into [`DocxDocument::parts`]
    pub part: usize,
}

/// Headers and footers of one `w:sectPr`, in reference order
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub headers: Vec<SectionPart>,
    pub footers: Vec<SectionPart>,
}

/// Non-owning handle to an element of a loaded document
///
/// Valid only for the [`DocxDocument`] it was produced from; handles are never
/// persisted, structural block ids are used across loads instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    /// Index into [`DocxDocument::parts`]
    pub part: usize,
    /// Child-index path from the part's document element
    pub path: Vec<usize>,
}

/// An opened DOCX document
#[derive(Debug, Clone)]
pub struct DocxDocument {
    package: DocxPackage,
    parts: Vec<XmlPart>,
    sections: Vec<Section>,
}

impl DocxDocument {
    /// Opens a document from raw bytes.
    ///
    /// The main part is required; a missing or malformed `word/document.xml`
    /// is a structural error. Header and footer parts that cannot be resolved
    /// or parsed are skipped with a warning.
    pub fn open(bytes: &[u8]) -> Result<Self, DocumentError> {
        let package = DocxPackage::from_bytes(bytes)?;

        let main_bytes = package
            .part(MAIN_PART)
            .ok_or_else(|| DocumentError::MissingPart(MAIN_PART.to_string()))?;
        let main = XmlDocument::parse(MAIN_PART, main_bytes)?;
        if main.root.first_child("w:body").is_none() {
            return Err(DocumentError::Structure(format!(
                "{MAIN_PART} has no w:body"
            )));
        }

        let rels = match package.part(MAIN_RELS) {
            Some(bytes) => parse_relationships(bytes)?,
            None => HashMap::new(),
        };

        let mut doc = Self {
            package,
            parts: vec![XmlPart {
                name: MAIN_PART.to_string(),
                kind: PartKind::Main,
                xml: main,
                dirty: false,
            }],
            sections: Vec::new(),
        };
        doc.load_sections(&rels);

        debug!(
            parts = doc.parts.len(),
            sections = doc.sections.len(),
            "Opened document"
        );
        Ok(doc)
    }

    fn load_sections(&mut self, rels: &HashMap<String, String>) {
        let references: Vec<Vec<(bool, String, String)>> = self
            .section_properties()
            .into_iter()
            .map(|sect_pr| {
                sect_pr
                    .child_elements()
                    .filter_map(|(_, el)| {
                        let is_header = match el.name.as_str() {
                            "w:headerReference" => true,
                            "w:footerReference" => false,
                            _ => return None,
                        };
                        let rel_id = el.attr("r:id")?.to_string();
                        let kind = el.attr("w:type").unwrap_or("default").to_string();
                        Some((is_header, kind, rel_id))
                    })
                    .collect()
            })
            .collect();

        let mut loaded: HashMap<String, usize> = HashMap::new();
        for refs in references {
            let mut section = Section::default();
            // Headers before footers regardless of their order in sectPr.
            for want_header in [true, false] {
                for (is_header, reference_type, rel_id) in refs.iter().filter(|r| r.0 == want_header) {
                    let Some(target) = rels.get(rel_id) else {
                        warn!(rel_id = %rel_id, "Section references unknown relationship, skipping");
                        continue;
                    };
                    if loaded.contains_key(target) {
                        continue;
                    }
                    let kind = if *is_header {
                        PartKind::Header
                    } else {
                        PartKind::Footer
                    };
                    let Some(part) = self.load_part(target, kind) else {
                        continue;
                    };
                    loaded.insert(target.clone(), part);
                    let entry = SectionPart {
                        reference_type: reference_type.clone(),
                        part,
                    };
                    if *is_header {
                        section.headers.push(entry);
                    } else {
                        section.footers.push(entry);
                    }
                }
            }
            self.sections.push(section);
        }
    }

    fn load_part(&mut self, name: &str, kind: PartKind) -> Option<usize> {
        let Some(bytes) = self.package.part(name) else {
            warn!(part = %name, "Referenced part is missing from the package, skipping");
            return None;
        };
        match XmlDocument::parse(name, bytes) {
            Ok(xml) => {
                self.parts.push(XmlPart {
                    name: name.to_string(),
                    kind,
                    xml,
                    dirty: false,
                });
                Some(self.parts.len() - 1)
            }
            Err(e) => {
                warn!(part = %name, error = %e, "Unreadable header/footer part, skipping");
                None
            }
        }
    }

    /// `w:sectPr` elements in document order: paragraph-level ones first as
    /// they appear, the body-level one last.
    fn section_properties(&self) -> Vec<&XmlElement> {
        let Some(body) = self.parts[0].xml.root.first_child("w:body") else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for (_, child) in body.child_elements() {
            match child.name.as_str() {
                "w:p" => {
                    if let Some(sect) = child
                        .first_child("w:pPr")
                        .and_then(|ppr| ppr.first_child("w:sectPr"))
                    {
                        found.push(sect);
                    }
                }
                "w:sectPr" => found.push(child),
                _ => {}
            }
        }
        found
    }

    /// Parsed parts; index 0 is always the main document part.
    pub fn parts(&self) -> &[XmlPart] {
        &self.parts
    }

    /// Sections in document order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// `w:body` of the main part with its child index under the root
    pub fn body(&self) -> Result<(usize, &XmlElement), DocumentError> {
        self.parts[0]
            .xml
            .root
            .child_elements()
            .find(|(_, el)| el.is("w:body"))
            .ok_or_else(|| DocumentError::Structure(format!("{MAIN_PART} has no w:body")))
    }

    /// Resolves a handle
    pub fn element(&self, handle: &ElementHandle) -> Option<&XmlElement> {
        self.parts.get(handle.part)?.xml.root.descendant(&handle.path)
    }

    /// Resolves a handle for editing; the owning part is re-serialized on save.
    pub fn element_mut(&mut self, handle: &ElementHandle) -> Option<&mut XmlElement> {
        let part = self.parts.get_mut(handle.part)?;
        part.dirty = true;
        part.xml.root.descendant_mut(&handle.path)
    }

    /// Writes modified parts back and returns the package bytes.
    pub fn save(&mut self) -> Result<Vec<u8>, DocumentError> {
        for part in self.parts.iter_mut().filter(|p| p.dirty) {
            let bytes = part.xml.to_bytes()?;
            self.package.set_part(&part.name, bytes);
            part.dirty = false;
        }
        self.package.to_bytes()
    }
}

/// Maps relationship ids to package part names, internal targets only.
fn parse_relationships(bytes: &[u8]) -> Result<HashMap<String, String>, DocumentError> {
    let xml = XmlDocument::parse(MAIN_RELS, bytes)?;
    let mut rels = HashMap::new();
    for (_, rel) in xml.root.child_elements().filter(|(_, el)| el.is("Relationship")) {
        if rel.attr("TargetMode") == Some("External") {
            continue;
        }
        if let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) {
            rels.insert(id.to_string(), resolve_target(target));
        }
    }
    Ok(rels)
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target.trim_start_matches("./")),
    }
}
