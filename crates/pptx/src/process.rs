//! Request processing: validate the upload, apply the rules, save the result.

use crate::document::PptxDocument;
use deck_core::{parse_rules, walker, Error, ReplacementRule, Result};

/// Extension an uploaded file must carry.
pub const PPTX_EXTENSION: &str = ".pptx";

/// Media type of a PPTX package.
pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// The edited presentation and the name it should be offered under.
#[derive(Debug, Clone)]
pub struct ProcessedDeck {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Apply a JSON-encoded rule list to an uploaded presentation.
///
/// The filename and rules are validated before the presentation is read.
pub fn process(filename: &str, data: &[u8], rules_json: &str) -> Result<ProcessedDeck> {
    check_filename(filename)?;
    let rules = parse_rules_payload(rules_json)?;

    edit(filename, data, &rules)
}

/// Parse a JSON rule list, reporting failures as invalid input.
pub fn parse_rules_payload(rules_json: &str) -> Result<Vec<ReplacementRule>> {
    parse_rules(rules_json).map_err(|e| Error::InvalidInput(format!("Invalid rules: {}", e)))
}

/// Apply already validated rules to an uploaded presentation.
pub fn process_with_rules(
    filename: &str,
    data: &[u8],
    rules: &[ReplacementRule],
) -> Result<ProcessedDeck> {
    check_filename(filename)?;
    edit(filename, data, rules)
}

/// Reject files that do not carry the PPTX extension.
pub fn check_filename(filename: &str) -> Result<()> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(PPTX_EXTENSION) {
        Ok(())
    } else {
        Err(Error::InvalidInput("Upload a .pptx file.".to_string()))
    }
}

/// Name under which an edited file is returned.
pub fn output_filename(filename: &str) -> String {
    format!("modified-{}", filename)
}

fn edit(filename: &str, data: &[u8], rules: &[ReplacementRule]) -> Result<ProcessedDeck> {
    let mut document = PptxDocument::open(data)
        .map_err(|e| Error::InvalidInput(format!("Invalid presentation: {}", e)))?;

    log::info!(
        "Applying {} rule(s) to {} ({} slides)",
        rules.len(),
        filename,
        document.presentation().slides.len()
    );
    walker::apply(document.presentation_mut(), rules);

    let bytes = document.save().map_err(|e| match e {
        Error::Processing(msg) => Error::Processing(msg),
        other => Error::Processing(other.to_string()),
    })?;

    Ok(ProcessedDeck {
        filename: output_filename(filename),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{self, DeckBuilder, FixtureSlide};

    fn deck_with_notes() -> Vec<u8> {
        DeckBuilder::new()
            .slide(
                FixtureSlide::new()
                    .shape(fixture::text_shape(
                        2,
                        &[fixture::paragraph(&[fixture::run("Title stays")])],
                    ))
                    .notes(&[fixture::paragraph(&[fixture::run("Thank {{NAME}}")])]),
            )
            .build()
    }

    #[test]
    fn test_wrong_extension_is_rejected_before_anything_else() {
        let err = process("slides.pdf", b"not even a zip", "not json").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(err.to_string(), "Upload a .pptx file.");
    }

    #[test]
    fn test_extension_check_ignores_case() {
        assert!(check_filename("Deck.PPTX").is_ok());
        assert!(check_filename("deck.ppt").is_err());
        assert!(check_filename("pptx").is_err());
    }

    #[test]
    fn test_bad_rules_are_rejected_before_loading() {
        let err = process("deck.pptx", b"not a zip", "{\"find\": 1}").unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().starts_with("Invalid rules:"));
    }

    #[test]
    fn test_unreadable_presentation_is_invalid_input() {
        let err = process("deck.pptx", b"not a zip", "[]").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().starts_with("Invalid presentation:"));
    }

    #[test]
    fn test_notes_substitution_leaves_body_alone() {
        let original = deck_with_notes();
        let result = process(
            "talk.pptx",
            &original,
            r#"[{"find": "{{NAME}}", "replace": "Dana"}]"#,
        )
        .unwrap();

        assert_eq!(result.filename, "modified-talk.pptx");

        let notes = fixture::read_part(&result.bytes, "ppt/notesSlides/notesSlide1.xml");
        assert!(notes.contains("<a:t>Thank Dana</a:t>"));
        assert_eq!(
            fixture::read_part(&result.bytes, "ppt/slides/slide1.xml"),
            fixture::read_part(&original, "ppt/slides/slide1.xml")
        );
    }

    #[test]
    fn test_process_with_rules_chains_in_order() {
        let bytes = DeckBuilder::new()
            .slide(FixtureSlide::new().shape(fixture::text_shape(
                2,
                &[fixture::paragraph(&[fixture::run("a")])],
            )))
            .build();
        let rules = vec![
            ReplacementRule::new("a", "b").unwrap(),
            ReplacementRule::new("b", "c").unwrap(),
        ];

        let result = process_with_rules("x.pptx", &bytes, &rules).unwrap();

        let slide = fixture::read_part(&result.bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains("<a:t>c</a:t>"));
    }
}
