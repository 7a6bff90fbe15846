//! Writes modified text back into the buffered XML parts.

use crate::xml::{Patch, XmlPart};
use deck_core::{Cell, Error, Presentation, Result, Run, Shape, TextAnchor, TextFrame};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Turns the modified units of a presentation into new part contents.
pub struct PptxWriter;

impl PptxWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render every part holding at least one modified unit.
    ///
    /// Returns `(part name, new content)` pairs; untouched parts are omitted.
    pub fn render(
        &self,
        presentation: &Presentation,
        parts: &[XmlPart],
    ) -> Result<Vec<(String, Vec<u8>)>> {
        let mut patches: BTreeMap<usize, Vec<Patch>> = BTreeMap::new();

        for slide in &presentation.slides {
            for shape in &slide.shapes {
                match shape {
                    Shape::TextFrame(frame) => self.frame_patches(frame, parts, &mut patches)?,
                    Shape::Table(table) => {
                        for cell in table.rows.iter().flatten().filter(|c| c.is_modified()) {
                            self.cell_patch(cell, parts, &mut patches)?;
                        }
                    }
                    Shape::Opaque => {}
                }
            }
            if let Some(notes) = &slide.notes {
                self.frame_patches(notes, parts, &mut patches)?;
            }
        }

        patches
            .into_iter()
            .map(|(idx, mut part_patches)| -> Result<(String, Vec<u8>)> {
                let part = &parts[idx];
                log::debug!("Rewriting {} ({} edits)", part.name, part_patches.len());
                Ok((part.name.clone(), part.render(&mut part_patches)?))
            })
            .collect()
    }

    fn frame_patches(
        &self,
        frame: &TextFrame,
        parts: &[XmlPart],
        patches: &mut BTreeMap<usize, Vec<Patch>>,
    ) -> Result<()> {
        let modified = frame
            .paragraphs
            .iter()
            .flat_map(|p| p.runs.iter())
            .filter(|r| r.is_modified());

        for run in modified {
            let part = part_for(parts, run.anchor())?;
            patches
                .entry(run.anchor().part)
                .or_default()
                .push(run_patch(part, run)?);
        }
        Ok(())
    }

    fn cell_patch(
        &self,
        cell: &Cell,
        parts: &[XmlPart],
        patches: &mut BTreeMap<usize, Vec<Patch>>,
    ) -> Result<()> {
        let Some(anchor) = cell.anchor() else {
            log::warn!("Cell without a text body cannot be rewritten; keeping it empty");
            return Ok(());
        };

        let part = part_for(parts, anchor)?;
        patches
            .entry(anchor.part)
            .or_default()
            .push(cell_body_patch(part, anchor, cell.text())?);
        Ok(())
    }
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn part_for(parts: &[XmlPart], anchor: TextAnchor) -> Result<&XmlPart> {
    parts
        .get(anchor.part)
        .ok_or_else(|| Error::Processing(format!("text anchored in unknown part {}", anchor.part)))
}

/// Start tag of the element at `index`, as a non-empty start.
fn opening(part: &XmlPart, index: usize) -> Result<BytesStart<'static>> {
    match part.events.get(index) {
        Some(Event::Start(e)) | Some(Event::Empty(e)) => Ok(e.clone().into_owned()),
        _ => Err(Error::Processing(format!(
            "{}: no element at event {}",
            part.name, index
        ))),
    }
}

fn closing(start: &BytesStart<'_>) -> BytesEnd<'static> {
    BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned())
}

/// Replace the content of a run's `a:t`, leaving its properties untouched.
fn run_patch(part: &XmlPart, run: &Run) -> Result<Patch> {
    let anchor = run.anchor();
    let start = opening(part, anchor.start)?;
    let end = closing(&start);

    Ok(Patch {
        start: anchor.start,
        end: anchor.end,
        events: vec![
            Event::Start(start),
            Event::Text(text_event(run.text())),
            Event::End(end),
        ],
    })
}

/// Replace all paragraphs of a cell's text body with plain paragraphs holding `text`.
///
/// Non-paragraph children of the body (`a:bodyPr`, `a:lstStyle`) are kept.
fn cell_body_patch(part: &XmlPart, anchor: TextAnchor, text: &str) -> Result<Patch> {
    let body = part.element_at(anchor.start).ok_or_else(|| {
        Error::Processing(format!("{}: no text body at event {}", part.name, anchor.start))
    })?;

    let start = opening(part, anchor.start)?;
    let end = closing(&start);
    let prefix = body.prefix().unwrap_or("a").to_string();

    let mut events = vec![Event::Start(start)];
    for child in body.children.iter().filter(|c| c.local != "p") {
        events.extend(part.events[child.start..=child.end].iter().cloned());
    }
    events.extend(paragraph_events(&prefix, text));
    events.push(Event::End(end));

    Ok(Patch {
        start: anchor.start,
        end: anchor.end,
        events,
    })
}

/// One `a:p` per `\n`-separated line; `\v` inside a line becomes `a:br`.
fn paragraph_events(prefix: &str, text: &str) -> Vec<Event<'static>> {
    let name = |local: &str| format!("{}:{}", prefix, local);
    let mut events = Vec::new();

    for line in text.split('\n') {
        if line.is_empty() {
            events.push(Event::Empty(BytesStart::new(name("p"))));
            continue;
        }

        events.push(Event::Start(BytesStart::new(name("p"))));
        for (idx, segment) in line.split('\u{b}').enumerate() {
            if idx > 0 {
                events.push(Event::Empty(BytesStart::new(name("br"))));
            }
            if segment.is_empty() {
                continue;
            }
            events.push(Event::Start(BytesStart::new(name("r"))));
            events.push(Event::Start(BytesStart::new(name("t"))));
            events.push(Event::Text(text_event(segment)));
            events.push(Event::End(BytesEnd::new(name("t"))));
            events.push(Event::End(BytesEnd::new(name("r"))));
        }
        events.push(Event::End(BytesEnd::new(name("p"))));
    }

    events
}

/// Escaped text content for an `a:t` element.
fn text_event(text: &str) -> BytesText<'static> {
    BytesText::new(&encode_control_chars(text)).into_owned()
}

/// Control characters are not allowed in XML 1.0; Office stores them as `_xHHHH_`.
fn encode_control_chars(text: &str) -> Cow<'_, str> {
    let is_control = |c: char| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r');
    if !text.contains(is_control) {
        return Cow::Borrowed(text);
    }

    let mut encoded = String::with_capacity(text.len() + 6);
    for c in text.chars() {
        if is_control(c) {
            encoded.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            encoded.push(c);
        }
    }
    Cow::Owned(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Writer;

    fn render_events(events: &[Event<'static>]) -> String {
        let mut writer = Writer::new(Vec::new());
        for event in events {
            writer.write_event(event).unwrap();
        }
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_paragraph_events() {
        assert_eq!(
            render_events(&paragraph_events("a", "Bob")),
            "<a:p><a:r><a:t>Bob</a:t></a:r></a:p>"
        );
        assert_eq!(
            render_events(&paragraph_events("a", "x\u{b}y\n\nz & w")),
            "<a:p><a:r><a:t>x</a:t></a:r><a:br/><a:r><a:t>y</a:t></a:r></a:p><a:p/><a:p><a:r><a:t>z &amp; w</a:t></a:r></a:p>"
        );
        assert_eq!(render_events(&paragraph_events("a", "")), "<a:p/>");
    }

    #[test]
    fn test_run_patch_expands_empty_text_element() {
        let part = XmlPart::parse(
            "s.xml",
            r#"<a:p xmlns:a="urn:a"><a:r><a:rPr i="1"/><a:t/></a:r></a:p>"#,
        )
        .unwrap();
        let t = part.root.descendant("t").unwrap();
        let mut run = Run::new("", TextAnchor::new(0, t.start, t.end));
        run.set_text("filled");

        let mut patches = vec![run_patch(&part, &run).unwrap()];
        let out = String::from_utf8(part.render(&mut patches).unwrap()).unwrap();

        assert_eq!(
            out,
            r#"<a:p xmlns:a="urn:a"><a:r><a:rPr i="1"/><a:t>filled</a:t></a:r></a:p>"#
        );
    }

    #[test]
    fn test_control_characters_are_encoded() {
        let part = XmlPart::parse("s.xml", r#"<a:r xmlns:a="urn:a"><a:t>x</a:t></a:r>"#).unwrap();
        let t = part.root.descendant("t").unwrap();
        let mut run = Run::new("x", TextAnchor::new(0, t.start, t.end));
        run.set_text("a\u{1}b\tc\u{1f}");

        let mut patches = vec![run_patch(&part, &run).unwrap()];
        let out = String::from_utf8(part.render(&mut patches).unwrap()).unwrap();

        assert_eq!(
            out,
            "<a:r xmlns:a=\"urn:a\"><a:t>a_x0001_b\tc_x001F_</a:t></a:r>"
        );
        assert_eq!(
            render_events(&paragraph_events("a", "x\u{b}y\u{7}")),
            "<a:p><a:r><a:t>x</a:t></a:r><a:br/><a:r><a:t>y_x0007_</a:t></a:r></a:p>"
        );
    }

    #[test]
    fn test_cell_body_patch_keeps_body_properties() {
        let part = XmlPart::parse(
            "s.xml",
            r#"<a:tc xmlns:a="urn:a"><a:txBody><a:bodyPr anchor="ctr"/><a:lstStyle/><a:p><a:pPr algn="r"/><a:r><a:rPr sz="1200"/><a:t>old</a:t></a:r></a:p><a:p/></a:txBody><a:tcPr/></a:tc>"#,
        )
        .unwrap();
        let body = part.root.child("txBody").unwrap();
        let anchor = TextAnchor::new(0, body.start, body.end);

        let mut patches = vec![cell_body_patch(&part, anchor, "new").unwrap()];
        let out = String::from_utf8(part.render(&mut patches).unwrap()).unwrap();

        assert_eq!(
            out,
            r#"<a:tc xmlns:a="urn:a"><a:txBody><a:bodyPr anchor="ctr"/><a:lstStyle/><a:p><a:r><a:t>new</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#
        );
    }

    #[test]
    fn test_unknown_part_is_a_processing_error() {
        let mut run = Run::new("a", TextAnchor::new(7, 0, 0));
        run.set_text("b");
        let mut frame = TextFrame::new();
        let mut paragraph = deck_core::Paragraph::new();
        paragraph.runs.push(run);
        frame.paragraphs.push(paragraph);

        let mut slide = deck_core::Slide::new(1);
        slide.add_shape(Shape::TextFrame(frame));
        let mut presentation = Presentation::new();
        presentation.add_slide(slide);

        let err = PptxWriter::new().render(&presentation, &[]).unwrap_err();
        assert!(matches!(err, Error::Processing(_)));
    }
}
