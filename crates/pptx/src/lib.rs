//! PPTX (Office Open XML) backend for rule-based text replacement.
//!
//! Opens .pptx files (ZIP archives of XML parts), exposes their slide,
//! table and notes text as a [`deck_core::Presentation`], and writes edited
//! text back without disturbing anything else in the package.

pub mod document;
pub mod package;
pub mod parser;
pub mod process;
pub mod rels;
pub mod writer;
pub mod xml;

#[cfg(any(test, feature = "test-support"))]
pub mod fixture;

pub use document::PptxDocument;
pub use parser::PptxParser;
pub use process::{
    check_filename, parse_rules_payload, process, process_with_rules, ProcessedDeck,
    PPTX_CONTENT_TYPE,
};
