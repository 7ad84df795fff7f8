//! Per-widget value appliers: how a resolved value lands in the DOM, and
//! what the widget's heuristic default is when no configured rule matched.
//! Appliers are idempotent; re-applying the same desired value never
//! flips a control that is already correct.

use rand::Rng;

use super::lexicon;
use super::scanner::{FieldDescriptor, FieldOption};
use crate::browser::BrowserPage;
use crate::errors::FieldError;

// ── free text ───────────────────────────────────────────────────────────

/// Clears the control and types `value`.
pub async fn apply_text(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
    value: &str,
) -> Result<(), FieldError> {
    page.clear(&field.handle).await?;
    page.type_text(&field.handle, value).await?;
    Ok(())
}

/// Bounded pseudo-random numeric filler (0–100), the last-resort value for
/// an empty text field when both the rules and the oracle came up short.
pub fn random_numeric_filler() -> String {
    rand::thread_rng().gen_range(0..=100u32).to_string()
}

// ── boolean radio pair ──────────────────────────────────────────────────

async fn click_radio(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
    index: usize,
) -> Result<String, FieldError> {
    let option = field.options.get(index).ok_or_else(|| FieldError::NoOption {
        label: field.label.clone(),
    })?;
    let handle = option.handle.as_ref().ok_or_else(|| FieldError::NoOption {
        label: field.label.clone(),
    })?;
    page.click(handle).await?;
    Ok(if option.value.is_empty() {
        option.text.clone()
    } else {
        option.value.clone()
    })
}

/// Configured boolean onto a two-radio grouping: prefer the option whose
/// value or label carries the matching lexicon keyword, else fall back to
/// positional convention (first = affirmative, second = negative).
pub async fn apply_radio_bool(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
    desired: bool,
) -> Result<String, FieldError> {
    let hit = field.options.iter().position(|o| {
        if desired {
            lexicon::is_affirmative(&o.value) || lexicon::is_affirmative(&o.text)
        } else {
            lexicon::is_negative(&o.value) || lexicon::is_negative(&o.text)
        }
    });
    let index = hit.unwrap_or(if desired { 0 } else { 1 });
    click_radio(page, field, index).await
}

/// Unconfigured default: the affirmative-looking option, else the first.
pub async fn radio_heuristic(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
) -> Result<String, FieldError> {
    let index = field
        .options
        .iter()
        .position(|o| lexicon::is_affirmative(&o.value) || lexicon::is_affirmative(&o.text))
        .unwrap_or(0);
    click_radio(page, field, index).await
}

// ── checkbox ────────────────────────────────────────────────────────────

/// Toggles only on a state mismatch. Clicking an already-correct checkbox
/// would invert it, so the current state is re-read right before acting.
pub async fn apply_checkbox(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
    desired: bool,
) -> Result<bool, FieldError> {
    let current = page.is_checked(&field.handle).await?;
    if current != desired {
        page.click(&field.handle).await?;
    }
    Ok(desired)
}

/// Affirmative-biased default: check it if unchecked, leave it otherwise.
pub async fn checkbox_heuristic(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
) -> Result<bool, FieldError> {
    apply_checkbox(page, field, true).await
}

// ── boolean-like select ─────────────────────────────────────────────────

fn affirmative_index(options: &[FieldOption]) -> usize {
    options
        .iter()
        .position(|o| lexicon::is_affirmative(&o.text) || lexicon::is_affirmative(&o.value))
        .unwrap_or(0)
}

/// Configured boolean onto a yes/no-like select. The option list excludes
/// the leading placeholder; a negative with no keyword hit falls back to
/// the second option.
pub async fn apply_boolean_select(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
    desired: bool,
) -> Result<String, FieldError> {
    let options = &field.options[1..];
    let index = if desired {
        affirmative_index(options)
    } else {
        options
            .iter()
            .position(|o| lexicon::is_negative(&o.text) || lexicon::is_negative(&o.value))
            .unwrap_or(1)
    };
    let option = options.get(index).ok_or_else(|| FieldError::NoOption {
        label: field.label.clone(),
    })?;
    page.select_value(&field.handle, &option.value).await?;
    Ok(option.value.clone())
}

/// Unconfigured default: the affirmative-looking option, else index 0 of
/// the non-placeholder list.
pub async fn boolean_select_heuristic(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
) -> Result<String, FieldError> {
    let options = &field.options[1..];
    let option = options
        .get(affirmative_index(options))
        .ok_or_else(|| FieldError::NoOption {
            label: field.label.clone(),
        })?;
    page.select_value(&field.handle, &option.value).await?;
    Ok(option.value.clone())
}

// ── multi-choice select ─────────────────────────────────────────────────

/// Applies a configured value by exact case-insensitive match against the
/// option values. `Ok(None)` on no match: the rule is treated as a
/// non-match and the pipeline proceeds to the next tier.
pub async fn apply_multi_choice_rule(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
    configured: &str,
) -> Result<Option<String>, FieldError> {
    let configured = configured.to_lowercase();
    match field
        .options
        .iter()
        .find(|o| o.value.to_lowercase() == configured)
    {
        Some(option) => {
            page.select_value(&field.handle, &option.value).await?;
            Ok(Some(option.value.clone()))
        }
        None => Ok(None),
    }
}

/// Options that are real answers: non-empty value and text that is not a
/// "select…"/"choose…" placeholder.
fn validated_options(field: &FieldDescriptor) -> Vec<&FieldOption> {
    field
        .options
        .iter()
        .filter(|o| {
            let text = o.text.to_lowercase();
            !o.value.trim().is_empty() && !text.contains("select") && !text.contains("choose")
        })
        .collect()
}

fn has_digit(option: &FieldOption) -> bool {
    option.value.chars().any(|c| c.is_ascii_digit())
        || option.text.chars().any(|c| c.is_ascii_digit())
}

/// First run of consecutive digits, parsed.
fn first_integer(s: &str) -> Option<i64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn leading_number(option: &FieldOption) -> Option<i64> {
    first_integer(&option.value).or_else(|| first_integer(&option.text))
}

/// Default pick when neither a rule nor the oracle produced a value:
/// 1. digit-bearing options: the one literally containing "5", else the
///    one whose leading integer is closest to 5 (first encountered wins
///    ties);
/// 2. yes/no-looking options: the affirmative one;
/// 3. otherwise the option at index 1 of the validated list (index 0 when
///    it is the only one).
fn pick_default(valid: &[&FieldOption]) -> Option<usize> {
    let digit_bearing: Vec<usize> = (0..valid.len()).filter(|&i| has_digit(valid[i])).collect();
    if !digit_bearing.is_empty() {
        if let Some(&i) = digit_bearing
            .iter()
            .find(|&&i| valid[i].value.contains('5') || valid[i].text.contains('5'))
        {
            return Some(i);
        }
        let mut best: Option<(usize, i64)> = None;
        for &i in &digit_bearing {
            if let Some(n) = leading_number(valid[i]) {
                let distance = (n - 5).abs();
                // Strict comparison keeps the first encountered on ties.
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((i, distance));
                }
            }
        }
        if let Some((i, _)) = best {
            return Some(i);
        }
    }

    let yes_no_like = |o: &FieldOption| {
        let text = o.text.to_lowercase();
        let value = o.value.to_lowercase();
        ["sí", "si", "yes", "no"].iter().any(|w| text.contains(w))
            || value.contains("yes")
            || value.contains("no")
    };
    if valid.iter().any(|o| yes_no_like(o)) {
        let yes_like = |o: &FieldOption| {
            let text = o.text.to_lowercase();
            ["sí", "si", "yes"].iter().any(|w| text.contains(w))
                || o.value.to_lowercase().contains("yes")
        };
        if let Some(i) = (0..valid.len()).find(|&i| yes_like(valid[i])) {
            return Some(i);
        }
    }

    if valid.len() > 1 {
        Some(1)
    } else if !valid.is_empty() {
        Some(0)
    } else {
        None
    }
}

/// Applies the multi-choice heuristic default described above.
pub async fn multi_choice_heuristic(
    page: &dyn BrowserPage,
    field: &FieldDescriptor,
) -> Result<String, FieldError> {
    let valid = validated_options(field);
    let index = pick_default(&valid).ok_or_else(|| FieldError::NoOption {
        label: field.label.clone(),
    })?;
    let value = valid[index].value.clone();
    page.select_value(&field.handle, &value).await?;
    Ok(value)
}
