//! Core domain types for rule-based text replacement in presentations:
//! replacement rules, the text transformer, and the presentation walker.

pub mod error;
pub mod rules;
pub mod transform;
pub mod types;
pub mod walker;

pub use error::{Error, Result};
pub use rules::{parse_rules, ReplacementRule};
pub use transform::TextTransformer;
pub use types::{Cell, Paragraph, Presentation, Run, Shape, Slide, Table, TextAnchor, TextFrame};
pub use walker::PresentationWalker;
