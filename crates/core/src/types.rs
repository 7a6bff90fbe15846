//! Domain types for the editable text content of a presentation.
//!
//! The tree mirrors the text containers of a deck: slides hold shapes and
//! optional speaker notes, shapes hold either a text frame or a table.
//! Formatting is never modeled here. Each leaf text unit carries a
//! [`TextAnchor`] pointing back into the package part it was read from, and
//! the package writer only rewrites the text of units marked as modified.

/// Location of a text unit inside a package part.
///
/// `part` indexes the parts loaded by the package reader; `start` and `end`
/// are the event indices of the element holding the text (equal for an empty
/// element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextAnchor {
    pub part: usize,
    pub start: usize,
    pub end: usize,
}

impl TextAnchor {
    pub fn new(part: usize, start: usize, end: usize) -> Self {
        Self { part, start, end }
    }
}

/// Represents the text content of an entire presentation.
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Whether any text unit has been rewritten.
    pub fn is_modified(&self) -> bool {
        self.slides.iter().any(Slide::is_modified)
    }
}

/// A single slide.
#[derive(Debug, Clone)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Shapes in tree order.
    pub shapes: Vec<Shape>,

    /// Text frame of the speaker notes, if the slide has any.
    pub notes: Option<TextFrame>,
}

impl Slide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
            notes: None,
        }
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn is_modified(&self) -> bool {
        self.shapes.iter().any(Shape::is_modified)
            || self.notes.as_ref().is_some_and(TextFrame::is_modified)
    }
}

/// The kinds of shape the walker distinguishes.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A shape with a text body.
    TextFrame(TextFrame),
    /// A table inside a graphic frame.
    Table(Table),
    /// Anything without editable text (pictures, charts, groups, connectors).
    Opaque,
}

impl Shape {
    pub fn is_modified(&self) -> bool {
        match self {
            Shape::TextFrame(frame) => frame.is_modified(),
            Shape::Table(table) => table.is_modified(),
            Shape::Opaque => false,
        }
    }
}

/// Paragraphs of a shape or notes body.
#[derive(Debug, Clone, Default)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated run text, paragraphs separated by `\n`.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_modified(&self) -> bool {
        self.paragraphs
            .iter()
            .flat_map(|p| p.runs.iter())
            .any(Run::is_modified)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

/// The smallest unit of text sharing one set of formatting.
///
/// Only the text is exposed; formatting stays in the source part untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    text: String,
    anchor: TextAnchor,
    modified: bool,
}

impl Run {
    pub fn new(text: impl Into<String>, anchor: TextAnchor) -> Self {
        Self {
            text: text.into(),
            anchor,
            modified: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the run's text. Setting identical text leaves it unmodified.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.modified = true;
        }
    }

    pub fn anchor(&self) -> TextAnchor {
        self.anchor
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// A table as a row-major grid of cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn is_modified(&self) -> bool {
        self.rows.iter().flatten().any(Cell::is_modified)
    }
}

/// A table cell, edited as a single string.
///
/// Paragraphs are separated by `\n` and line breaks inside a paragraph are
/// represented by `\v`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: String,
    /// Text body of the cell; `None` when the cell has no text body.
    anchor: Option<TextAnchor>,
    modified: bool,
}

impl Cell {
    pub fn new(text: impl Into<String>, anchor: Option<TextAnchor>) -> Self {
        Self {
            text: text.into(),
            anchor,
            modified: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.modified = true;
        }
    }

    pub fn anchor(&self) -> Option<TextAnchor> {
        self.anchor
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }
}
