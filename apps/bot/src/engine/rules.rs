//! Configured rule tables: ordered lists of case-insensitive label patterns
//! mapped to typed values. Precedence is insertion order of the
//! configuration, never pattern specificity, so the table is an ordered
//! list of pairs rather than a map.

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
struct Rule<V> {
    pattern: Regex,
    value: V,
}

/// Ordered label-pattern → value table. First matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct RuleTable<V> {
    rules: Vec<Rule<V>>,
}

impl<V> RuleTable<V> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule. Malformed patterns error here so a bad configuration
    /// fails at startup, not mid-run.
    pub fn push(&mut self, pattern: &str, value: V) -> Result<(), regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        self.rules.push(Rule { pattern, value });
        Ok(())
    }

    /// Value of the first rule whose pattern matches `label`.
    pub fn find(&self, label: &str) -> Option<&V> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(label))
            .map(|rule| &rule.value)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The three per-category tables the pipeline consults. Years-of-experience
/// and language-proficiency entries are merged into `text` and
/// `multiple_choice` at build time.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub booleans: RuleTable<bool>,
    pub text: RuleTable<String>,
    pub multiple_choice: RuleTable<String>,
}
