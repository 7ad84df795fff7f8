//! Multilingual affirmative/negative keyword sets. The boolean heuristics
//! classify an option or label as yes-like or no-like by substring lookup
//! against these, matching how the site renders localized forms.

pub const AFFIRMATIVE: &[&str] = &["yes", "sí", "si", "true", "oui", "ja", "sim", "tak"];
pub const NEGATIVE: &[&str] = &["no", "false", "non", "nein", "não", "nie"];

/// True when `text` contains any affirmative keyword (case-insensitive).
pub fn is_affirmative(text: &str) -> bool {
    let text = text.to_lowercase();
    AFFIRMATIVE.iter().any(|word| text.contains(word))
}

/// True when `text` contains any negative keyword (case-insensitive).
pub fn is_negative(text: &str) -> bool {
    let text = text.to_lowercase();
    NEGATIVE.iter().any(|word| text.contains(word))
}
