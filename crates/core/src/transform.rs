//! Text transformation driven by an ordered list of replacement rules.

use crate::ReplacementRule;
use regex::{NoExpand, Regex, RegexBuilder};
use std::borrow::Cow;

/// A rule prepared for repeated application.
#[derive(Debug, Clone)]
enum CompiledRule {
    /// Regular expression; `replace` may reference capture groups.
    Pattern { regex: Regex, replace: String },
    /// Case-insensitive literal, matched through an escaped pattern.
    Folded { regex: Regex, replace: String },
    /// Exact literal substring.
    Literal { find: String, replace: String },
}

impl CompiledRule {
    fn compile(rule: &ReplacementRule) -> Self {
        let replace = rule.replace().to_string();

        if rule.is_regex() {
            match RegexBuilder::new(rule.find())
                .case_insensitive(rule.ignores_case())
                .build()
            {
                Ok(regex) => Self::Pattern { regex, replace },
                Err(e) => {
                    log::warn!(
                        "Invalid pattern {:?}, falling back to literal replacement: {}",
                        rule.find(),
                        e
                    );
                    Self::Literal {
                        find: rule.find().to_string(),
                        replace,
                    }
                }
            }
        } else if rule.ignores_case() {
            match RegexBuilder::new(&regex::escape(rule.find()))
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => Self::Folded { regex, replace },
                // Only reachable through the size limit on very long literals.
                Err(e) => {
                    log::warn!("Could not build case-insensitive matcher: {}", e);
                    Self::Literal {
                        find: rule.find().to_string(),
                        replace,
                    }
                }
            }
        } else {
            Self::Literal {
                find: rule.find().to_string(),
                replace,
            }
        }
    }

    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self {
            Self::Pattern { regex, replace } => regex.replace_all(text, replace.as_str()),
            Self::Folded { regex, replace } => regex.replace_all(text, NoExpand(replace.as_str())),
            Self::Literal { find, replace } => {
                if text.contains(find.as_str()) {
                    Cow::Owned(text.replace(find.as_str(), replace))
                } else {
                    Cow::Borrowed(text)
                }
            }
        }
    }
}

/// Applies an ordered list of rules to text.
///
/// Each rule sees the output of the previous one. Invalid regular
/// expressions never fail the transformation; they degrade to a literal
/// replacement of the raw pattern text.
#[derive(Debug, Clone, Default)]
pub struct TextTransformer {
    rules: Vec<CompiledRule>,
}

impl TextTransformer {
    /// Compile the given rules, preserving their order.
    pub fn new(rules: &[ReplacementRule]) -> Self {
        Self {
            rules: rules.iter().map(CompiledRule::compile).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Transform `text`, borrowing it back when no rule changed anything.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if text.is_empty() {
            return Cow::Borrowed(text);
        }

        let mut current = Cow::Borrowed(text);
        for rule in &self.rules {
            let next = match rule.apply(&current) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = next {
                current = Cow::Owned(s);
            }
        }

        current
    }
}

/// One-shot transformation of `text` by `rules`.
pub fn apply(text: &str, rules: &[ReplacementRule]) -> String {
    TextTransformer::new(rules).apply(text).into_owned()
}
