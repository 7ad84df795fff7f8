//! Field inventory scanner: a read-only pass over the current wizard page
//! that turns raw controls of one widget kind into `FieldDescriptor`s.
//! Output order is DOM encounter order and is stable across repeated scans
//! of an unmodified page; that order is the resolution order.

use tracing::{debug, warn};

use super::lexicon;
use crate::browser::{BrowserPage, Element, PageError, SelectOption};
use crate::selectors;

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Text,
    BooleanRadioPair,
    Checkbox,
    BooleanSelect,
    MultiChoiceSelect,
}

impl WidgetKind {
    /// Select-backed kinds are skipped when already populated; the other
    /// appliers are idempotent and re-run every step.
    pub fn skip_when_populated(self) -> bool {
        matches!(self, WidgetKind::BooleanSelect | WidgetKind::MultiChoiceSelect)
    }
}

/// One selectable option of a control. Radio options carry the handle of
/// their own input; select options are applied through the select itself.
#[derive(Debug, Clone)]
pub struct FieldOption {
    pub text: String,
    pub value: String,
    pub handle: Option<Element>,
}

/// Snapshot of one form control, created fresh on every scan and owned by
/// the current pipeline pass. Never persisted.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub kind: WidgetKind,
    pub handle: Element,
    pub label: String,
    pub current_value: String,
    pub options: Vec<FieldOption>,
    pub is_populated: bool,
}

/// Enumerates controls of `kind` on the current page. Read errors on an
/// individual control are caught and the control reported unpopulated, so a
/// flaky read costs at worst a redundant refill, never a silent skip.
pub async fn scan(page: &dyn BrowserPage, kind: WidgetKind) -> Result<Vec<FieldDescriptor>, PageError> {
    let fields = match kind {
        WidgetKind::Text => scan_text(page).await?,
        WidgetKind::BooleanRadioPair => scan_radio_pairs(page).await?,
        WidgetKind::Checkbox => scan_checkboxes(page).await?,
        WidgetKind::BooleanSelect | WidgetKind::MultiChoiceSelect => scan_selects(page, kind).await?,
    };
    debug!(?kind, count = fields.len(), "scanned form controls");
    Ok(fields)
}

/// Associated label text, or `"Unknown"` when unresolvable.
async fn label_of(page: &dyn BrowserPage, el: &Element) -> String {
    match page.label_text(el).await {
        Ok(Some(label)) => {
            let label = label.trim().to_string();
            if label.is_empty() {
                UNKNOWN_LABEL.to_string()
            } else {
                label
            }
        }
        Ok(None) => UNKNOWN_LABEL.to_string(),
        Err(e) => {
            warn!("label read failed: {e}");
            UNKNOWN_LABEL.to_string()
        }
    }
}

async fn scan_text(page: &dyn BrowserPage) -> Result<Vec<FieldDescriptor>, PageError> {
    let mut fields = Vec::new();

    for el in page.query(selectors::TEXT_INPUT).await? {
        // Phone and home-city inputs belong to the special-field pass.
        let is_special = page.matches(&el, selectors::PHONE_INPUT).await.unwrap_or(false)
            || page.matches(&el, selectors::HOME_CITY_INPUT).await.unwrap_or(false);
        if is_special {
            continue;
        }

        let label = label_of(page, &el).await;
        let current_value = match page.value(&el).await {
            Ok(value) => value,
            Err(e) => {
                warn!(%label, "value read failed, treating as unpopulated: {e}");
                String::new()
            }
        };
        let is_populated = !current_value.trim().is_empty();

        fields.push(FieldDescriptor {
            kind: WidgetKind::Text,
            handle: el,
            label,
            current_value,
            options: Vec::new(),
            is_populated,
        });
    }

    Ok(fields)
}

async fn scan_radio_pairs(page: &dyn BrowserPage) -> Result<Vec<FieldDescriptor>, PageError> {
    let mut fields = Vec::new();

    for fieldset in page.query(selectors::FIELDSET).await? {
        let radios = match page.query_in(&fieldset, selectors::RADIO_INPUT).await {
            Ok(radios) => radios,
            Err(e) => {
                warn!("fieldset radios unreadable, skipping: {e}");
                continue;
            }
        };
        // Only two-option groupings are boolean radio pairs.
        if radios.len() != 2 {
            continue;
        }

        let label = label_of(page, &fieldset).await;
        let mut options = Vec::with_capacity(2);
        let mut current_value = String::new();
        let mut is_populated = false;

        for radio in radios {
            let value = page.value(&radio).await.unwrap_or_default();
            let text = page
                .label_text(&radio)
                .await
                .ok()
                .flatten()
                .unwrap_or_default();
            if page.is_checked(&radio).await.unwrap_or(false) {
                is_populated = true;
                current_value = value.clone();
            }
            options.push(FieldOption {
                text,
                value,
                handle: Some(radio),
            });
        }

        fields.push(FieldDescriptor {
            kind: WidgetKind::BooleanRadioPair,
            handle: fieldset,
            label,
            current_value,
            options,
            is_populated,
        });
    }

    Ok(fields)
}

async fn scan_checkboxes(page: &dyn BrowserPage) -> Result<Vec<FieldDescriptor>, PageError> {
    let mut fields = Vec::new();

    for el in page.query(selectors::CHECKBOX).await? {
        // The follow-company checkbox is handled by its own step.
        if page
            .matches(&el, selectors::FOLLOW_COMPANY_CHECKBOX)
            .await
            .unwrap_or(false)
        {
            continue;
        }

        let label = label_of(page, &el).await;
        let checked = page.is_checked(&el).await.unwrap_or(false);

        fields.push(FieldDescriptor {
            kind: WidgetKind::Checkbox,
            handle: el,
            label,
            current_value: checked.to_string(),
            options: Vec::new(),
            is_populated: checked,
        });
    }

    Ok(fields)
}

/// A select is boolean-like when its non-placeholder options carry both an
/// affirmative and a negative lexicon hit; everything else is multi-choice.
fn classify_select(options: &[SelectOption]) -> WidgetKind {
    let rest = &options[1..];
    let affirmative = rest
        .iter()
        .any(|o| lexicon::is_affirmative(&o.text) || lexicon::is_affirmative(&o.value));
    let negative = rest
        .iter()
        .any(|o| lexicon::is_negative(&o.text) || lexicon::is_negative(&o.value));
    if rest.len() >= 2 && affirmative && negative {
        WidgetKind::BooleanSelect
    } else {
        WidgetKind::MultiChoiceSelect
    }
}

async fn scan_selects(page: &dyn BrowserPage, want: WidgetKind) -> Result<Vec<FieldDescriptor>, PageError> {
    let mut fields = Vec::new();

    for el in page.query(selectors::SELECT).await? {
        let options = match page.options(&el).await {
            Ok(options) => options,
            Err(e) => {
                warn!("select options unreadable, skipping: {e}");
                continue;
            }
        };
        // Empty or placeholder-only selects never reach the pipeline.
        if options.len() < 2 {
            continue;
        }
        if classify_select(&options) != want {
            continue;
        }

        let label = label_of(page, &el).await;
        let selected = page.selected_index(&el).await.unwrap_or(-1);
        let current_value = usize::try_from(selected)
            .ok()
            .and_then(|i| options.get(i))
            .map(|o| o.value.clone())
            .unwrap_or_default();
        // Populated iff a non-first, non-empty option is selected.
        let is_populated = selected > 0 && !current_value.trim().is_empty();

        fields.push(FieldDescriptor {
            kind: want,
            handle: el,
            label,
            current_value,
            options: options
                .into_iter()
                .map(|o| FieldOption {
                    text: o.text,
                    value: o.value,
                    handle: None,
                })
                .collect(),
            is_populated,
        });
    }

    Ok(fields)
}
