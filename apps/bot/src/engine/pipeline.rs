//! Tiered field resolution. For every unresolved field the pipeline tries,
//! in strict order, a configured rule, then either the widget heuristic or
//! the generative oracle, and records which tier produced the value.
//!
//! The tier order is deliberately asymmetric per widget family:
//! - boolean widgets: rule → heuristic, never the oracle (the lexicon
//!   heuristic always suffices and oracle calls are slow and costly);
//! - multi-choice selects: rule → oracle → heuristic;
//! - free text: rule → oracle → bounded random filler, because text has no
//!   enumerable option space for a heuristic to rank.
//!
//! Failures at one tier never abort the pipeline for other fields; every
//! field gets its own `ResolutionOutcome`.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::appliers;
use super::rules::RuleSet;
use super::scanner::{FieldDescriptor, WidgetKind};
use crate::browser::BrowserPage;
use crate::errors::FieldError;
use crate::llm_client::{FieldKind, Oracle, OracleRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    ConfiguredRule,
    HeuristicDefault,
    GenerativeFallback,
}

/// Record of one field resolution, for logging and tests. Not required for
/// correctness downstream.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub label: String,
    pub kind: WidgetKind,
    /// Value that landed in the DOM; `None` when the field was deliberately
    /// left untouched or the resolution failed.
    pub applied: Option<String>,
    pub tier: ResolutionTier,
    pub error: Option<String>,
}

impl ResolutionOutcome {
    fn applied(field: &FieldDescriptor, tier: ResolutionTier, value: String) -> Self {
        info!(label = %field.label, ?tier, value = %value, "field resolved");
        Self {
            label: field.label.clone(),
            kind: field.kind,
            applied: Some(value),
            tier,
            error: None,
        }
    }

    fn untouched(field: &FieldDescriptor, tier: ResolutionTier) -> Self {
        debug!(label = %field.label, ?tier, "field left untouched");
        Self {
            label: field.label.clone(),
            kind: field.kind,
            applied: None,
            tier,
            error: None,
        }
    }

    fn failed(field: &FieldDescriptor, tier: ResolutionTier, error: &FieldError) -> Self {
        warn!(label = %field.label, ?tier, %error, "field resolution failed");
        Self {
            label: field.label.clone(),
            kind: field.kind,
            applied: None,
            tier,
            error: Some(error.to_string()),
        }
    }

    fn from_result(
        field: &FieldDescriptor,
        tier: ResolutionTier,
        result: Result<String, FieldError>,
    ) -> Self {
        match result {
            Ok(value) => Self::applied(field, tier, value),
            Err(e) => Self::failed(field, tier, &e),
        }
    }
}

/// Resolves one field. Never panics and never propagates an error: whatever
/// happens, the caller gets an outcome and sibling fields still run.
pub async fn resolve(
    page: &dyn BrowserPage,
    oracle: &dyn Oracle,
    context: &Value,
    rules: &RuleSet,
    field: &FieldDescriptor,
) -> ResolutionOutcome {
    match field.kind {
        WidgetKind::Text => resolve_text(page, oracle, context, rules, field).await,
        WidgetKind::BooleanRadioPair | WidgetKind::Checkbox | WidgetKind::BooleanSelect => {
            resolve_boolean(page, rules, field).await
        }
        WidgetKind::MultiChoiceSelect => {
            resolve_multi_choice(page, oracle, context, rules, field).await
        }
    }
}

/// Text tier order: rule → oracle → random filler (only when still empty).
async fn resolve_text(
    page: &dyn BrowserPage,
    oracle: &dyn Oracle,
    context: &Value,
    rules: &RuleSet,
    field: &FieldDescriptor,
) -> ResolutionOutcome {
    if let Some(value) = rules.text.find(&field.label) {
        let result = appliers::apply_text(page, field, value)
            .await
            .map(|_| value.clone());
        return ResolutionOutcome::from_result(field, ResolutionTier::ConfiguredRule, result);
    }

    let request = OracleRequest {
        context,
        kind: FieldKind::Text,
        label: &field.label,
        options: None,
    };
    match oracle.answer(request).await {
        Ok(answer) => {
            let result = appliers::apply_text(page, field, &answer)
                .await
                .map(|_| answer);
            ResolutionOutcome::from_result(field, ResolutionTier::GenerativeFallback, result)
        }
        Err(e) => {
            warn!(label = %field.label, %e, "oracle unavailable, using deterministic fallback");
            // Re-read rather than trust the scan: an earlier applier on the
            // same page may have changed the DOM.
            let current = page
                .value(&field.handle)
                .await
                .unwrap_or_else(|_| field.current_value.clone());
            if !current.trim().is_empty() {
                return ResolutionOutcome::untouched(field, ResolutionTier::HeuristicDefault);
            }
            let filler = appliers::random_numeric_filler();
            let result = appliers::apply_text(page, field, &filler)
                .await
                .map(|_| filler);
            ResolutionOutcome::from_result(field, ResolutionTier::HeuristicDefault, result)
        }
    }
}

/// Boolean widgets: rule → heuristic. The oracle is never consulted.
async fn resolve_boolean(
    page: &dyn BrowserPage,
    rules: &RuleSet,
    field: &FieldDescriptor,
) -> ResolutionOutcome {
    if let Some(&desired) = rules.booleans.find(&field.label) {
        let result = match field.kind {
            WidgetKind::BooleanRadioPair => appliers::apply_radio_bool(page, field, desired).await,
            WidgetKind::Checkbox => appliers::apply_checkbox(page, field, desired)
                .await
                .map(|b| b.to_string()),
            _ => appliers::apply_boolean_select(page, field, desired).await,
        };
        return ResolutionOutcome::from_result(field, ResolutionTier::ConfiguredRule, result);
    }

    let result = match field.kind {
        WidgetKind::BooleanRadioPair => appliers::radio_heuristic(page, field).await,
        WidgetKind::Checkbox => appliers::checkbox_heuristic(page, field)
            .await
            .map(|b| b.to_string()),
        _ => appliers::boolean_select_heuristic(page, field).await,
    };
    ResolutionOutcome::from_result(field, ResolutionTier::HeuristicDefault, result)
}

/// Multi-choice selects: rule → oracle → heuristic.
async fn resolve_multi_choice(
    page: &dyn BrowserPage,
    oracle: &dyn Oracle,
    context: &Value,
    rules: &RuleSet,
    field: &FieldDescriptor,
) -> ResolutionOutcome {
    if let Some(configured) = rules.multiple_choice.find(&field.label) {
        match appliers::apply_multi_choice_rule(page, field, configured).await {
            Ok(Some(value)) => {
                return ResolutionOutcome::applied(field, ResolutionTier::ConfiguredRule, value)
            }
            Ok(None) => {
                debug!(label = %field.label, %configured, "configured value not among options");
            }
            Err(e) => {
                warn!(label = %field.label, %e, "configured rule could not be applied");
            }
        }
    }

    let option_values: Vec<String> = field
        .options
        .iter()
        .map(|o| o.value.clone())
        .filter(|v| !v.trim().is_empty())
        .collect();
    let request = OracleRequest {
        context,
        kind: FieldKind::MultipleChoice,
        label: &field.label,
        options: Some(&option_values),
    };
    match oracle.answer(request).await {
        Ok(answer) => {
            let answer_lc = answer.to_lowercase();
            let hit = field
                .options
                .iter()
                .find(|o| !o.value.trim().is_empty() && o.value.to_lowercase() == answer_lc);
            if let Some(option) = hit {
                let result = page
                    .select_value(&field.handle, &option.value)
                    .await
                    .map(|_| option.value.clone())
                    .map_err(FieldError::from);
                return ResolutionOutcome::from_result(
                    field,
                    ResolutionTier::GenerativeFallback,
                    result,
                );
            }
            warn!(label = %field.label, %answer, "oracle answer is not an option, using heuristic");
        }
        Err(e) => {
            warn!(label = %field.label, %e, "oracle unavailable, using heuristic");
        }
    }

    let result = appliers::multi_choice_heuristic(page, field).await;
    ResolutionOutcome::from_result(field, ResolutionTier::HeuristicDefault, result)
}
