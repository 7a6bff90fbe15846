//! In-memory PPTX builder for tests.
//!
//! Produces the smallest package the parser accepts: content types, package
//! and presentation relationships, slides with optional notes slides.

use quick_xml::escape::escape;
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const TREE_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

/// A slide under construction.
#[derive(Debug, Clone, Default)]
pub struct FixtureSlide {
    shapes: Vec<String>,
    notes: Option<Vec<String>>,
}

impl FixtureSlide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a shape element (see [`text_shape`], [`table_shape`], [`picture_shape`]).
    pub fn shape(mut self, xml: String) -> Self {
        self.shapes.push(xml);
        self
    }

    /// Give the slide a notes slide whose body holds these paragraphs.
    pub fn notes(mut self, paragraphs: &[String]) -> Self {
        self.notes = Some(paragraphs.to_vec());
        self
    }
}

/// Builds a PPTX package in memory.
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    slides: Vec<FixtureSlide>,
    reversed: bool,
    capitalized_targets: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, slide: FixtureSlide) -> Self {
        self.slides.push(slide);
        self
    }

    /// List the slides in `presentation.xml` in reverse file order.
    pub fn reversed_order(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// Point relationships at `Slide1.xml`-style names while the entries stay lower case.
    pub fn capitalized_targets(mut self) -> Self {
        self.capitalized_targets = true;
        self
    }

    fn target_name(&self, stem: &str, n: usize) -> String {
        if self.capitalized_targets {
            let mut chars = stem.chars();
            let first = chars.next().map(|c| c.to_ascii_uppercase());
            format!("{}{}{}.xml", first.map(String::from).unwrap_or_default(), chars.as_str(), n)
        } else {
            format!("{}{}.xml", stem, n)
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut files: Vec<(String, String)> = Vec::new();

        files.push(("[Content_Types].xml".to_string(), self.content_types()));
        files.push(("_rels/.rels".to_string(), root_rels("ppt/presentation.xml")));
        files.push(("ppt/presentation.xml".to_string(), self.presentation_xml()));
        files.push((
            "ppt/_rels/presentation.xml.rels".to_string(),
            self.presentation_rels(),
        ));

        for (idx, slide) in self.slides.iter().enumerate() {
            let n = idx + 1;
            files.push((
                format!("ppt/slides/slide{}.xml", n),
                format!(
                    r#"{DECL}<p:sld {NAMESPACES}><p:cSld><p:spTree>{TREE_PROPS}{}</p:spTree></p:cSld></p:sld>"#,
                    slide.shapes.concat()
                ),
            ));

            if let Some(paragraphs) = &slide.notes {
                files.push((
                    format!("ppt/slides/_rels/slide{}.xml.rels", n),
                    relationships(&[(
                        "rId2",
                        "notesSlide",
                        format!("../notesSlides/{}", self.target_name("notesSlide", n)).as_str(),
                    )]),
                ));
                files.push((
                    format!("ppt/notesSlides/notesSlide{}.xml", n),
                    notes_xml(paragraphs),
                ));
            }
        }

        let borrowed: Vec<(&str, &str)> = files
            .iter()
            .map(|(name, content)| (name.as_str(), content.as_str()))
            .collect();
        zip_of(&borrowed)
    }

    fn content_types(&self) -> String {
        let mut overrides = String::from(
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
        );
        for (idx, slide) in self.slides.iter().enumerate() {
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                idx + 1
            ));
            if slide.notes.is_some() {
                overrides.push_str(&format!(
                    r#"<Override PartName="/ppt/notesSlides/notesSlide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/>"#,
                    idx + 1
                ));
            }
        }

        format!(
            r#"{DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{overrides}</Types>"#
        )
    }

    fn presentation_xml(&self) -> String {
        let mut order: Vec<usize> = (1..=self.slides.len()).collect();
        if self.reversed {
            order.reverse();
        }

        let ids: String = order
            .iter()
            .map(|n| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1))
            .collect();

        format!(
            r#"{DECL}<p:presentation {NAMESPACES}><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
        )
    }

    fn presentation_rels(&self) -> String {
        let targets: Vec<(String, String)> = (1..=self.slides.len())
            .map(|n| (format!("rId{}", n + 1), format!("slides/{}", self.target_name("slide", n))))
            .collect();
        let rels: Vec<(&str, &str, &str)> = targets
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str()))
            .collect();
        relationships(&rels)
    }
}

/// `_rels/.rels` pointing the package at `main_part`.
pub fn root_rels(main_part: &str) -> String {
    relationships(&[("rId1", "officeDocument", main_part)])
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let items: String = rels
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL_NS}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"{DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{items}</Relationships>"#
    )
}

fn notes_xml(paragraphs: &[String]) -> String {
    format!(
        r#"{DECL}<p:notes {NAMESPACES}><p:cSld><p:spTree>{TREE_PROPS}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#,
        paragraphs.concat()
    )
}

/// `<a:p>` holding the given runs.
pub fn paragraph(runs: &[String]) -> String {
    format!("<a:p>{}</a:p>", runs.concat())
}

/// A plain run.
pub fn run(text: &str) -> String {
    format!(
        r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r>"#,
        escape(text)
    )
}

/// A bold run.
pub fn bold_run(text: &str) -> String {
    format!(
        r#"<a:r><a:rPr lang="en-US" b="1" dirty="0"/><a:t>{}</a:t></a:r>"#,
        escape(text)
    )
}

/// A text box.
pub fn text_shape(id: u32, paragraphs: &[String]) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr wrap="square"/><a:lstStyle/>{}</p:txBody></p:sp>"#,
        paragraphs.concat()
    )
}

/// A table graphic frame; empty strings produce empty cells.
pub fn table_shape(id: u32, rows: &[&[&str]]) -> String {
    let columns = rows.first().map(|r| r.len()).unwrap_or(0);
    let grid: String = (0..columns).map(|_| r#"<a:gridCol w="3048000"/>"#).collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|text| {
                    let paragraph = if text.is_empty() {
                        r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#.to_string()
                    } else {
                        format!(
                            r#"<a:p><a:r><a:rPr lang="en-US" sz="1800"/><a:t>{}</a:t></a:r></a:p>"#,
                            escape(*text)
                        )
                    };
                    format!(
                        r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{paragraph}</a:txBody><a:tcPr/></a:tc>"#
                    )
                })
                .collect();
            format!(r#"<a:tr h="370840">{cells}</a:tr>"#)
        })
        .collect();

    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="6096000" cy="741680"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>{grid}</a:tblGrid>{body}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#
    )
}

/// A picture, which carries no editable text.
pub fn picture_shape(id: u32) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId9"/></p:blipFill><p:spPr/></p:pic>"#
    )
}

/// A deflated ZIP archive of the given text files.
pub fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in files {
        zip.start_file(*name, options).expect("fixture entry");
        zip.write_all(content.as_bytes()).expect("fixture write");
    }
    zip.finish().expect("fixture archive").into_inner()
}

/// Content of one entry of an archive, as text.
pub fn read_part(archive: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(archive)).expect("valid archive");
    let mut content = String::new();
    archive
        .by_name(name)
        .expect("entry present")
        .read_to_string(&mut content)
        .expect("utf-8 entry");
    content
}
