//! An opened PPTX file whose text can be edited and saved.

use crate::package::Package;
use crate::parser::PptxParser;
use crate::writer::PptxWriter;
use crate::xml::XmlPart;
use deck_core::{Presentation, Result};
use std::collections::HashMap;

/// A presentation package loaded for editing.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    package: Package,
    parts: Vec<XmlPart>,
    presentation: Presentation,
}

impl PptxDocument {
    /// Load a package from its raw bytes.
    pub fn open(data: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(data)?;
        let deck = PptxParser::new().parse(&package)?;

        Ok(Self {
            package,
            parts: deck.parts,
            presentation: deck.presentation,
        })
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut Presentation {
        &mut self.presentation
    }

    /// Serialize the package with every modified text unit written back.
    ///
    /// Parts without modified units are copied byte for byte.
    pub fn save(&self) -> Result<Vec<u8>> {
        let rendered = PptxWriter::new().render(&self.presentation, &self.parts)?;
        let replacements: HashMap<String, Vec<u8>> = rendered.into_iter().collect();

        log::debug!("Saving package with {} rewritten part(s)", replacements.len());
        self.package.to_bytes_with(&replacements)
    }
}
