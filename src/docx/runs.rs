//! Paragraph text and its reverse index onto runs
//!
//! A paragraph's visible text is spread over `w:t` elements inside runs, with
//! tabs and line breaks as separate empty elements. [`RunIndex`] flattens that
//! into one string (one char per underlying character) and remembers, for every
//! char, which segment it came from and its offset there. [`replace_span`]
//! uses the index to rewrite a char range in place across run boundaries.

use super::xml::{XmlElement, XmlNode};
use std::fmt;

/// Characters folded to a plain space in block text
pub const SPACE_LIKE: [char; 3] = ['\u{00A0}', '\u{202F}', '\u{2007}'];

/// Kind of a paragraph text segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// `w:t` character data
    Text,
    /// `w:tab`, rendered as `'\t'`
    Tab,
    /// `w:br` / `w:cr`, rendered as `'\n'`
    Break,
    /// `w:noBreakHyphen`, rendered as `'-'`
    Hyphen,
}

/// One contiguous piece of paragraph text
#[derive(Debug, Clone)]
pub struct RunSegment {
    /// Child-index path from the paragraph element to the segment element
    pub path: Vec<usize>,
    /// Segment kind
    pub kind: SegmentKind,
    /// Length in chars
    pub len: usize,
}

/// Flattened paragraph text plus reverse index
#[derive(Debug, Clone, Default)]
pub struct RunIndex {
    text: String,
    segments: Vec<RunSegment>,
    char_map: Vec<(usize, usize)>,
}

/// Elements whose subtree never contributes visible paragraph text
const SKIPPED: &[&str] = &[
    "w:pPr",
    "w:rPr",
    "w:sdtPr",
    "w:sdtEndPr",
    "w:del",
    "w:moveFrom",
    "w:delText",
    "w:instrText",
    "w:drawing",
    "w:pict",
    "w:object",
    "mc:AlternateContent",
    "w:txbxContent",
    "w:p",
    "w:footnoteReference",
    "w:endnoteReference",
    "w:commentReference",
];

impl RunIndex {
    /// Builds the index for a paragraph element.
    ///
    /// Fails when a `w:t` contains child elements, which is not valid
    /// WordprocessingML and leaves the text unaddressable.
    pub fn build(paragraph: &XmlElement) -> Result<Self, String> {
        let mut index = RunIndex::default();
        let mut path = Vec::new();
        index.walk(paragraph, &mut path)?;
        Ok(index)
    }

    fn walk(&mut self, el: &XmlElement, path: &mut Vec<usize>) -> Result<(), String> {
        for (i, child) in el.child_elements() {
            path.push(i);
            match child.name.as_str() {
                "w:t" => {
                    if child.has_element_children() {
                        return Err(format!("w:t at {path:?} contains markup"));
                    }
                    let text: String = child
                        .text()
                        .chars()
                        .map(|c| if SPACE_LIKE.contains(&c) { ' ' } else { c })
                        .collect();
                    self.push(path, SegmentKind::Text, &text);
                }
                "w:tab" | "w:ptab" => self.push(path, SegmentKind::Tab, "\t"),
                "w:br" | "w:cr" => self.push(path, SegmentKind::Break, "\n"),
                "w:noBreakHyphen" => self.push(path, SegmentKind::Hyphen, "-"),
                name if SKIPPED.contains(&name) => {}
                _ => self.walk(child, path)?,
            }
            path.pop();
        }
        Ok(())
    }

    fn push(&mut self, path: &[usize], kind: SegmentKind, text: &str) {
        let seg = self.segments.len();
        let mut len = 0;
        for (offset, c) in text.chars().enumerate() {
            self.char_map.push((seg, offset));
            self.text.push(c);
            len += 1;
        }
        self.segments.push(RunSegment {
            path: path.to_vec(),
            kind,
            len,
        });
    }

    /// Normalized paragraph text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of chars in [`text`](Self::text)
    pub fn char_len(&self) -> usize {
        self.char_map.len()
    }

    /// Segments in document order
    pub fn segments(&self) -> &[RunSegment] {
        &self.segments
    }

    /// Maps a char offset to `(segment index, offset within segment)`
    pub fn locate(&self, char_idx: usize) -> Option<(usize, usize)> {
        self.char_map.get(char_idx).copied()
    }

    /// Chars `[start, end)` of the text, or `None` if out of range
    pub fn slice(&self, start: usize, end: usize) -> Option<String> {
        if start > end || end > self.char_len() {
            return None;
        }
        Some(self.text.chars().skip(start).take(end - start).collect())
    }
}

/// Why an in-place span edit could not be performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanEditError {
    /// `[start, end)` is empty or beyond the paragraph text
    OutOfRange,
    /// The span covers only tabs/breaks, there is no run to hold the text
    NoTextRun,
    /// The index no longer matches the tree
    StaleIndex,
}

impl fmt::Display for SpanEditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "span out of range"),
            Self::NoTextRun => write!(f, "span contains no text run"),
            Self::StaleIndex => write!(f, "run index does not match paragraph"),
        }
    }
}

/// Rewrites chars `[start, end)` of the paragraph text with `replacement`.
///
/// The replacement lands in the first `w:t` touched by the span and inherits
/// that run's formatting. Covered text in later runs is removed, covered tabs
/// and breaks are deleted. `'\n'` and `'\t'` inside the replacement become
/// `w:br` and `w:tab` siblings in the anchor run.
pub fn replace_span(
    paragraph: &mut XmlElement,
    index: &RunIndex,
    start: usize,
    end: usize,
    replacement: &str,
) -> Result<(), SpanEditError> {
    if start >= end || end > index.char_len() {
        return Err(SpanEditError::OutOfRange);
    }
    let (first_seg, first_off) = index.locate(start).ok_or(SpanEditError::OutOfRange)?;
    let (last_seg, last_off) = index.locate(end - 1).ok_or(SpanEditError::OutOfRange)?;
    let segments = index.segments();

    let anchor = (first_seg..=last_seg)
        .find(|&s| segments[s].kind == SegmentKind::Text)
        .ok_or(SpanEditError::NoTextRun)?;

    // Later segments first so removals never shift a path still to be visited.
    for seg_idx in (first_seg..=last_seg).rev() {
        let seg = &segments[seg_idx];
        let from = if seg_idx == first_seg { first_off } else { 0 };
        let to = if seg_idx == last_seg { last_off + 1 } else { seg.len };

        if seg.kind != SegmentKind::Text {
            remove_node(paragraph, &seg.path)?;
            continue;
        }

        let el = paragraph
            .descendant_mut(&seg.path)
            .ok_or(SpanEditError::StaleIndex)?;
        let current: Vec<char> = el.text().chars().collect();
        if to > current.len() || from > to {
            return Err(SpanEditError::StaleIndex);
        }
        let prefix: String = current[..from].iter().collect();
        let suffix: String = current[to..].iter().collect();

        if seg_idx == anchor {
            write_anchor(paragraph, &seg.path, &prefix, replacement, &suffix)?;
        } else {
            el.set_text(format!("{prefix}{suffix}"));
            el.set_attr("xml:space", "preserve");
        }
    }

    Ok(())
}

fn write_anchor(
    paragraph: &mut XmlElement,
    path: &[usize],
    prefix: &str,
    replacement: &str,
    suffix: &str,
) -> Result<(), SpanEditError> {
    let full = format!("{prefix}{replacement}{suffix}");

    if !full.contains(['\n', '\t']) {
        let el = paragraph
            .descendant_mut(path)
            .ok_or(SpanEditError::StaleIndex)?;
        el.set_text(full);
        el.set_attr("xml:space", "preserve");
        return Ok(());
    }

    let (parent_path, last) = path.split_at(path.len() - 1);
    let idx = last[0];
    let parent = paragraph
        .descendant_mut(parent_path)
        .ok_or(SpanEditError::StaleIndex)?;
    let template = parent
        .children
        .get(idx)
        .and_then(XmlNode::as_element)
        .ok_or(SpanEditError::StaleIndex)?
        .clone();

    let nodes = split_run_content(&full, &template);
    parent.children.splice(idx..=idx, nodes);
    Ok(())
}

/// Splits text into `w:t` / `w:br` / `w:tab` run content.
fn split_run_content(text: &str, template: &XmlElement) -> Vec<XmlNode> {
    let mut nodes = Vec::new();
    let mut buffer = String::new();

    let flush = |buffer: &mut String, nodes: &mut Vec<XmlNode>| {
        if !buffer.is_empty() {
            let mut t = XmlElement::new("w:t");
            t.attributes = template.attributes.clone();
            t.set_attr("xml:space", "preserve");
            t.set_text(std::mem::take(buffer));
            nodes.push(XmlNode::Element(t));
        }
    };

    for c in text.chars() {
        match c {
            '\n' => {
                flush(&mut buffer, &mut nodes);
                nodes.push(XmlNode::Element(XmlElement::new("w:br")));
            }
            '\t' => {
                flush(&mut buffer, &mut nodes);
                nodes.push(XmlNode::Element(XmlElement::new("w:tab")));
            }
            c => buffer.push(c),
        }
    }
    flush(&mut buffer, &mut nodes);
    nodes
}

fn remove_node(paragraph: &mut XmlElement, path: &[usize]) -> Result<(), SpanEditError> {
    let (parent_path, last) = path.split_at(path.len().saturating_sub(1));
    let idx = *last.first().ok_or(SpanEditError::StaleIndex)?;
    let parent = paragraph
        .descendant_mut(parent_path)
        .ok_or(SpanEditError::StaleIndex)?;
    if idx >= parent.children.len() {
        return Err(SpanEditError::StaleIndex);
    }
    parent.children.remove(idx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::XmlDocument;

    fn paragraph(xml: &str) -> XmlElement {
        let wrapped = format!(r#"<w:document xmlns:w="urn:w">{xml}</w:document>"#);
        let doc = XmlDocument::parse("test", wrapped.as_bytes()).unwrap();
        doc.root.descendant(&[0]).unwrap().clone()
    }

    #[test]
    fn test_index_concatenates_runs() {
        let p = paragraph(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left"/></w:tabs></w:pPr><w:r><w:t>Hello </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t><w:tab/><w:t>x</w:t></w:r></w:p>"#,
        );
        let index = RunIndex::build(&p).unwrap();
        assert_eq!(index.text(), "Hello world\tx");
        assert_eq!(index.segments().len(), 4);
        assert_eq!(index.locate(6), Some((1, 0)));
        assert_eq!(index.locate(11), Some((2, 0)));
    }

    #[test]
    fn test_index_folds_nbsp_and_breaks() {
        let p = paragraph("<w:p><w:r><w:t>A\u{00A0}B</w:t><w:br/><w:t>C</w:t></w:r></w:p>");
        let index = RunIndex::build(&p).unwrap();
        assert_eq!(index.text(), "A B\nC");
    }

    #[test]
    fn test_index_descends_into_inline_containers() {
        let p = paragraph(
            r#"<w:p><w:hyperlink><w:r><w:t>link</w:t></w:r></w:hyperlink><w:del><w:r><w:delText>gone</w:delText></w:r></w:del><w:sdt><w:sdtPr/><w:sdtContent><w:r><w:t>!</w:t></w:r></w:sdtContent></w:sdt></w:p>"#,
        );
        let index = RunIndex::build(&p).unwrap();
        assert_eq!(index.text(), "link!");
    }

    #[test]
    fn test_replace_within_single_run() {
        let mut p = paragraph("<w:p><w:r><w:t>Call Ivan now</w:t></w:r></w:p>");
        let index = RunIndex::build(&p).unwrap();
        replace_span(&mut p, &index, 5, 9, "TOKEN").unwrap();
        assert_eq!(RunIndex::build(&p).unwrap().text(), "Call TOKEN now");
    }

    #[test]
    fn test_replace_across_runs_keeps_first_run_formatting() {
        let mut p = paragraph(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>ООО «Ро</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>машка» и</w:t></w:r></w:p>"#,
        );
        let index = RunIndex::build(&p).unwrap();
        replace_span(&mut p, &index, 0, 14, "T").unwrap();

        let after = RunIndex::build(&p).unwrap();
        assert_eq!(after.text(), "T и");
        let first_run = p.descendant(&[0]).unwrap();
        assert!(first_run.first_child("w:rPr").unwrap().first_child("w:b").is_some());
        assert_eq!(first_run.first_child("w:t").unwrap().text(), "T");
    }

    #[test]
    fn test_replace_consumes_break() {
        let mut p = paragraph("<w:p><w:r><w:t>MINISTRY OF X</w:t><w:br/><w:t>AND Y, Moscow</w:t></w:r></w:p>");
        let index = RunIndex::build(&p).unwrap();
        assert_eq!(index.slice(0, 19).unwrap(), "MINISTRY OF X\nAND Y");
        replace_span(&mut p, &index, 0, 19, "TOKEN").unwrap();
        assert_eq!(RunIndex::build(&p).unwrap().text(), "TOKEN, Moscow");
    }

    #[test]
    fn test_replacement_with_newline_becomes_break() {
        let mut p = paragraph("<w:p><w:r><w:t>x TOKEN y</w:t></w:r></w:p>");
        let index = RunIndex::build(&p).unwrap();
        replace_span(&mut p, &index, 2, 7, "A\nB").unwrap();
        let after = RunIndex::build(&p).unwrap();
        assert_eq!(after.text(), "x A\nB y");
        assert!(after
            .segments()
            .iter()
            .any(|s| s.kind == SegmentKind::Break));
    }

    #[test]
    fn test_span_of_only_tabs_is_rejected() {
        let mut p = paragraph("<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p>");
        let index = RunIndex::build(&p).unwrap();
        assert_eq!(
            replace_span(&mut p, &index, 1, 2, "T"),
            Err(SpanEditError::NoTextRun)
        );
        assert_eq!(
            replace_span(&mut p, &index, 2, 9, "T"),
            Err(SpanEditError::OutOfRange)
        );
    }
}
