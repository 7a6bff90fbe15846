//! PPTX package parser: builds the editable text tree of a presentation.

use crate::package::Package;
use crate::rels::{self, Relationships, NOTES_SLIDE, OFFICE_DOCUMENT};
use crate::xml::{Element, XmlPart};
use deck_core::{
    Cell, Error, Paragraph, Presentation, Result, Run, Shape, Slide, Table, TextAnchor, TextFrame,
};

/// The text tree of a presentation together with the parts it points into.
///
/// Every [`TextAnchor::part`] in `presentation` indexes `parts`.
#[derive(Debug, Clone)]
pub struct ParsedDeck {
    pub presentation: Presentation,
    pub parts: Vec<XmlPart>,
}

/// Parser for PPTX (Office Open XML) packages.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse the slides and speaker notes of a package.
    pub fn parse(&self, package: &Package) -> Result<ParsedDeck> {
        let main_part = self.main_part(package)?;
        let slide_paths = self.slide_order(package, &main_part)?;

        let mut presentation = Presentation::new();
        let mut parts = Vec::new();

        for (idx, slide_path) in slide_paths.iter().enumerate() {
            let slide = self.parse_slide(package, slide_path, idx + 1, &mut parts)?;
            presentation.add_slide(slide);
        }

        log::debug!(
            "Parsed {} slides from {} ({} parts buffered)",
            presentation.slides.len(),
            main_part,
            parts.len()
        );

        Ok(ParsedDeck {
            presentation,
            parts,
        })
    }

    /// Locate the main presentation part through the package relationships.
    fn main_part(&self, package: &Package) -> Result<String> {
        let rels_path = rels::rels_path_for("");
        let rels = Relationships::parse(&package.read_string(&rels_path)?)?;

        let target = rels
            .first_of_type(OFFICE_DOCUMENT)
            .map(|r| rels::resolve_target("", &r.target))
            .ok_or_else(|| Error::MissingPart("officeDocument relationship".to_string()))?;

        package
            .canonical_name(&target)
            .map(str::to_string)
            .ok_or(Error::MissingPart(target))
    }

    /// Get the ordered list of slide paths from the slide id list.
    fn slide_order(&self, package: &Package, main_part: &str) -> Result<Vec<String>> {
        let part = XmlPart::parse(main_part, &package.read_string(main_part)?)?;
        if part.root.local != "presentation" {
            return Err(Error::InvalidInput(format!(
                "package is not a presentation (main part is <{}>)",
                part.root.qname
            )));
        }

        let rels_path = rels::rels_path_for(main_part);
        let rels = Relationships::parse(&package.read_string(&rels_path)?)?;

        let Some(id_list) = part.root.child("sldIdLst") else {
            return Ok(Vec::new());
        };

        let mut slides = Vec::new();
        for slide_id in id_list.children_named("sldId") {
            // The relationship id is the namespaced `r:id`, not the numeric `id`.
            let rel_id = part
                .find_attribute(slide_id, |key| {
                    key.contains(&b':') && crate::xml::local_name(key) == b"id"
                })
                .ok_or_else(|| Error::XmlError(format!("{}: sldId without r:id", main_part)))?;

            let rel = rels
                .by_id(&rel_id)
                .ok_or_else(|| Error::MissingPart(format!("slide relationship {}", rel_id)))?;

            // Targets may differ in case from the stored entry; keep the stored name.
            let path = rels::resolve_target(main_part, &rel.target);
            let path = package
                .canonical_name(&path)
                .map(str::to_string)
                .ok_or(Error::MissingPart(path))?;
            slides.push(path);
        }

        Ok(slides)
    }

    /// Parse a single slide and its notes, buffering their parts.
    fn parse_slide(
        &self,
        package: &Package,
        slide_path: &str,
        slide_number: usize,
        parts: &mut Vec<XmlPart>,
    ) -> Result<Slide> {
        let part = XmlPart::parse(slide_path, &package.read_string(slide_path)?)?;
        let part_idx = parts.len();
        let mut slide = Slide::new(slide_number);

        if let Some(tree) = part.root.descendant("spTree") {
            for child in &tree.children {
                let shape = match child.local.as_str() {
                    // Properties of the tree itself, not shapes.
                    "nvGrpSpPr" | "grpSpPr" | "extLst" => continue,
                    "sp" => match child.child("txBody") {
                        Some(body) => Shape::TextFrame(text_frame(&part, body, part_idx)),
                        None => Shape::Opaque,
                    },
                    "graphicFrame" => match child.descendant("tbl") {
                        Some(tbl) => Shape::Table(table(&part, tbl, part_idx)),
                        None => Shape::Opaque,
                    },
                    _ => Shape::Opaque,
                };
                slide.add_shape(shape);
            }
        }

        parts.push(part);
        slide.notes = self.parse_notes(package, slide_path, parts);

        Ok(slide)
    }

    /// Text frame of the notes body placeholder, if the slide has notes.
    fn parse_notes(
        &self,
        package: &Package,
        slide_path: &str,
        parts: &mut Vec<XmlPart>,
    ) -> Option<TextFrame> {
        let rels_path = rels::rels_path_for(slide_path);
        if !package.contains(&rels_path) {
            return None;
        }

        let loaded = package
            .read_string(&rels_path)
            .and_then(|xml| Relationships::parse(&xml))
            .and_then(|rels| {
                let Some(rel) = rels.first_of_type(NOTES_SLIDE) else {
                    return Ok(None);
                };
                let target = rels::resolve_target(slide_path, &rel.target);
                let path = package
                    .canonical_name(&target)
                    .ok_or(Error::MissingPart(target.clone()))?;
                let xml = package.read_string(path)?;
                XmlPart::parse(path, &xml).map(Some)
            });

        let part = match loaded {
            Ok(Some(part)) => part,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Skipping notes of {}: {}", slide_path, e);
                return None;
            }
        };

        let part_idx = parts.len();
        let frame = notes_body(&part).map(|body| text_frame(&part, body, part_idx));
        if frame.is_some() {
            parts.push(part);
        }
        frame
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Text body of the notes placeholder (`<p:ph type="body"/>`).
fn notes_body(part: &XmlPart) -> Option<&Element> {
    let tree = part.root.descendant("spTree")?;
    tree.children_named("sp")
        .find(|sp| {
            sp.child("nvSpPr")
                .and_then(|nv| nv.child("nvPr"))
                .and_then(|nv| nv.child("ph"))
                .and_then(|ph| part.attribute(ph, "type"))
                .is_some_and(|t| t == "body")
        })
        .and_then(|sp| sp.child("txBody"))
}

/// Paragraphs and runs of a text body, each run anchored at its `a:t`.
fn text_frame(part: &XmlPart, body: &Element, part_idx: usize) -> TextFrame {
    let mut frame = TextFrame::new();

    for p in body.children_named("p") {
        let mut paragraph = Paragraph::new();
        for r in p.children_named("r") {
            if let Some(t) = r.child("t") {
                let anchor = TextAnchor::new(part_idx, t.start, t.end);
                paragraph.runs.push(Run::new(part.text_content(t), anchor));
            }
        }
        frame.paragraphs.push(paragraph);
    }

    frame
}

/// Table cells in row-major order, each anchored at its text body.
fn table(part: &XmlPart, tbl: &Element, part_idx: usize) -> Table {
    let mut table = Table::new();

    for tr in tbl.children_named("tr") {
        let row = tr
            .children_named("tc")
            .map(|tc| match tc.child("txBody") {
                Some(body) => Cell::new(
                    cell_text(part, body),
                    Some(TextAnchor::new(part_idx, body.start, body.end)),
                ),
                None => Cell::new("", None),
            })
            .collect();
        table.rows.push(row);
    }

    table
}

/// Whole-cell text: paragraphs joined by `\n`, line breaks read as `\v`.
fn cell_text(part: &XmlPart, body: &Element) -> String {
    body.children_named("p")
        .map(|p| {
            let mut text = String::new();
            for child in &p.children {
                match child.local.as_str() {
                    "r" | "fld" => {
                        if let Some(t) = child.child("t") {
                            text.push_str(&part.text_content(t));
                        }
                    }
                    "br" => text.push('\u{b}'),
                    _ => {}
                }
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}
