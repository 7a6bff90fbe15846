//! Walks the text containers of a presentation and rewrites their text.

use crate::{Presentation, ReplacementRule, Shape, Slide, Table, TextFrame, TextTransformer};

/// Counts of text units rewritten on one slide.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SlideChanges {
    runs: usize,
    cells: usize,
    notes_runs: usize,
}

/// Applies a [`TextTransformer`] to every text unit of a presentation.
///
/// Slides are visited in order; on each slide shapes are visited in tree
/// order, then the speaker notes. Text frames are transformed run by run so
/// a rule never matches across a run boundary, and tables cell by cell.
pub struct PresentationWalker<'a> {
    transformer: &'a TextTransformer,
}

impl<'a> PresentationWalker<'a> {
    pub fn new(transformer: &'a TextTransformer) -> Self {
        Self { transformer }
    }

    /// Rewrite the presentation in place.
    pub fn walk(&self, presentation: &mut Presentation) {
        if self.transformer.is_empty() {
            return;
        }

        for slide in &mut presentation.slides {
            let changes = self.walk_slide(slide);
            if changes != SlideChanges::default() {
                log::debug!(
                    "Slide {}: rewrote {} run(s), {} cell(s), {} notes run(s)",
                    slide.number,
                    changes.runs,
                    changes.cells,
                    changes.notes_runs
                );
            }
        }
    }

    fn walk_slide(&self, slide: &mut Slide) -> SlideChanges {
        let mut changes = SlideChanges::default();

        for shape in &mut slide.shapes {
            match shape {
                Shape::Table(table) => changes.cells += self.walk_table(table),
                Shape::TextFrame(frame) => changes.runs += self.walk_text_frame(frame),
                Shape::Opaque => {}
            }
        }

        if let Some(notes) = slide.notes.as_mut() {
            changes.notes_runs += self.walk_text_frame(notes);
        }

        changes
    }

    fn walk_table(&self, table: &mut Table) -> usize {
        let mut changed = 0;
        for cell in table.rows.iter_mut().flatten() {
            let updated = self.transformer.apply(cell.text()).into_owned();
            if updated != cell.text() {
                cell.set_text(updated);
                changed += 1;
            }
        }
        changed
    }

    fn walk_text_frame(&self, frame: &mut TextFrame) -> usize {
        let mut changed = 0;
        for run in frame.paragraphs.iter_mut().flat_map(|p| p.runs.iter_mut()) {
            let updated = self.transformer.apply(run.text()).into_owned();
            if updated != run.text() {
                run.set_text(updated);
                changed += 1;
            }
        }
        changed
    }
}

/// Apply `rules` to every text unit of `presentation`.
pub fn apply(presentation: &mut Presentation, rules: &[ReplacementRule]) {
    let transformer = TextTransformer::new(rules);
    PresentationWalker::new(&transformer).walk(presentation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Paragraph, Run, TextAnchor};

    fn rule(find: &str, replace: &str) -> ReplacementRule {
        ReplacementRule::new(find, replace).unwrap()
    }

    fn frame(paragraphs: &[&[&str]]) -> TextFrame {
        let mut frame = TextFrame::new();
        for (p_idx, runs) in paragraphs.iter().enumerate() {
            let mut paragraph = Paragraph::new();
            for (r_idx, text) in runs.iter().enumerate() {
                paragraph
                    .runs
                    .push(Run::new(*text, TextAnchor::new(0, p_idx * 10 + r_idx, p_idx * 10 + r_idx)));
            }
            frame.paragraphs.push(paragraph);
        }
        frame
    }

    fn table(rows: &[&[&str]]) -> Table {
        Table {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|t| Cell::new(*t, None)).collect())
                .collect(),
        }
    }

    #[test]
    fn test_runs_are_rewritten_individually() {
        let mut slide = Slide::new(1);
        slide.add_shape(Shape::TextFrame(frame(&[&["Dear ", "{{NAME}}", ","]])));
        let mut presentation = Presentation::new();
        presentation.add_slide(slide);

        apply(&mut presentation, &[rule("{{NAME}}", "Alice")]);

        let Shape::TextFrame(frame) = &presentation.slides[0].shapes[0] else {
            panic!("expected text frame");
        };
        let runs = &frame.paragraphs[0].runs;
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].text(), "Alice");
        assert!(!runs[0].is_modified());
        assert!(runs[1].is_modified());
        assert!(!runs[2].is_modified());
    }

    #[test]
    fn test_rules_do_not_match_across_runs() {
        let mut slide = Slide::new(1);
        slide.add_shape(Shape::TextFrame(frame(&[&["{{NA", "ME}}"]])));
        let mut presentation = Presentation::new();
        presentation.add_slide(slide);

        apply(&mut presentation, &[rule("{{NAME}}", "Alice")]);

        assert!(!presentation.is_modified());
    }

    #[test]
    fn test_table_cells_are_rewritten_whole() {
        let mut slide = Slide::new(1);
        slide.add_shape(Shape::Table(table(&[&["{{NAME}}", "b"], &["c", "d"]])));
        let mut presentation = Presentation::new();
        presentation.add_slide(slide);

        apply(&mut presentation, &[rule("{{NAME}}", "Bob")]);

        let Shape::Table(table) = &presentation.slides[0].shapes[0] else {
            panic!("expected table");
        };
        assert_eq!(table.cell(0, 0).map(Cell::text), Some("Bob"));
        assert_eq!(table.cell(0, 1).map(Cell::text), Some("b"));
        assert_eq!(table.cell(1, 0).map(Cell::text), Some("c"));
        assert_eq!(table.cell(1, 1).map(Cell::text), Some("d"));
        assert!(!table.cell(1, 1).unwrap().is_modified());
    }

    #[test]
    fn test_notes_and_opaque_shapes() {
        let mut slide = Slide::new(1);
        slide.add_shape(Shape::Opaque);
        slide.add_shape(Shape::TextFrame(frame(&[&["Body"]])));
        slide.notes = Some(frame(&[&["Say {{NAME}}"], &["later"]]));

        let mut bare = Slide::new(2);
        bare.add_shape(Shape::TextFrame(frame(&[&["{{NAME}}"]])));

        let mut presentation = Presentation::new();
        presentation.add_slide(slide);
        presentation.add_slide(bare);

        apply(&mut presentation, &[rule("{{NAME}}", "Carol")]);

        let first = &presentation.slides[0];
        assert_eq!(first.notes.as_ref().unwrap().text(), "Say Carol\nlater");
        assert!(!first.shapes[1].is_modified());

        let Shape::TextFrame(frame) = &presentation.slides[1].shapes[0] else {
            panic!("expected text frame");
        };
        assert_eq!(frame.text(), "Carol");
        assert!(presentation.slides[1].notes.is_none());
    }

    #[test]
    fn test_empty_rule_list_changes_nothing() {
        let mut slide = Slide::new(1);
        slide.add_shape(Shape::TextFrame(frame(&[&["text"]])));
        let mut presentation = Presentation::new();
        presentation.add_slide(slide);

        apply(&mut presentation, &[]);

        assert!(!presentation.is_modified());
    }
}
