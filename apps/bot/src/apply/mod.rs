//! Wizard step driver: orchestrates one application from the job page to
//! the post-submission confirmation. Each step runs the special-field
//! passes, then the scanner and resolution pipeline over every widget kind
//! in a fixed order, then advances. The loop is bounded by a hard step cap
//! so a form that never terminates becomes a failed application, not a
//! hang.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::browser::BrowserPage;
use crate::control::PauseControl;
use crate::engine::{self, ResolutionOutcome, RuleSet, WidgetKind};
use crate::errors::ApplyError;
use crate::jitter;
use crate::llm_client::Oracle;
use crate::selectors;

pub mod special;

pub use special::SpecialFields;

/// Hard bound on wizard pages per application.
pub const DEFAULT_MAX_STEPS: u32 = 5;

const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Widget-kind pass order within one step. Free text first, selects last,
/// mirroring the order the form renders its controls.
const PASS_ORDER: [WidgetKind; 5] = [
    WidgetKind::Text,
    WidgetKind::BooleanRadioPair,
    WidgetKind::Checkbox,
    WidgetKind::BooleanSelect,
    WidgetKind::MultiChoiceSelect,
];

/// What one application attempt did. `submitted` is false only in dry-run
/// mode, where the driver stops short of the final submit click.
#[derive(Debug)]
pub struct ApplicationReport {
    pub outcomes: Vec<ResolutionOutcome>,
    pub submitted: bool,
}

pub struct WizardDriver<'a> {
    page: &'a dyn BrowserPage,
    oracle: &'a dyn Oracle,
    rules: &'a RuleSet,
    context: &'a Value,
    special: &'a SpecialFields,
    pause: &'a PauseControl,
    max_steps: u32,
    submit: bool,
}

impl<'a> WizardDriver<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        page: &'a dyn BrowserPage,
        oracle: &'a dyn Oracle,
        rules: &'a RuleSet,
        context: &'a Value,
        special: &'a SpecialFields,
        pause: &'a PauseControl,
        max_steps: u32,
        submit: bool,
    ) -> Self {
        Self {
            page,
            oracle,
            rules,
            context,
            special,
            pause,
            max_steps,
            submit,
        }
    }

    /// Runs one full application against `job_url`.
    pub async fn apply(&self, job_url: &str) -> Result<ApplicationReport, ApplyError> {
        self.page.goto(job_url).await?;
        jitter::small_random_delay().await;

        let button = self
            .page
            .query_one(selectors::EASY_APPLY_BUTTON)
            .await?
            .ok_or_else(|| ApplyError::NoApplyButton {
                url: job_url.to_string(),
            })?;
        self.page.click(&button).await?;

        // Step obstacles (validation errors, a missing advance control) are
        // retried within the step budget: a later fill pass may satisfy the
        // complaint. Only exhausting the cap escalates.
        const CAP_REACHED: &str = "step cap reached without a submit control";
        let mut outcomes = Vec::new();
        let mut obstacle = CAP_REACHED.to_string();
        for step in 0..self.max_steps {
            self.pause.checkpoint().await;
            jitter::small_random_delay().await;
            debug!(step, "filling wizard step");
            self.fill_step(&mut outcomes).await?;

            if let Some(submit_button) = self.page.query_one(selectors::SUBMIT_BUTTON).await? {
                if !self.submit {
                    info!(url = %job_url, "dry run, stopping before submit");
                    return Ok(ApplicationReport {
                        outcomes,
                        submitted: false,
                    });
                }
                self.page.click(&submit_button).await?;
                self.page
                    .wait_for(selectors::POST_APPLY_MODAL, CONFIRMATION_TIMEOUT)
                    .await
                    .map_err(|_| ApplyError::NoConfirmation {
                        url: job_url.to_string(),
                    })?;
                info!(url = %job_url, steps = step + 1, fields = outcomes.len(), "application submitted");
                return Ok(ApplicationReport {
                    outcomes,
                    submitted: true,
                });
            }

            match self.page.query_one(selectors::NEXT_BUTTON).await? {
                Some(next) => {
                    self.page.click(&next).await?;
                    jitter::small_random_delay().await;
                    if self.page.query_one(selectors::VALIDATION_ERROR).await?.is_some() {
                        warn!(step, "validation error after advancing, retrying");
                        obstacle = "validation error still visible at the step cap".to_string();
                    } else {
                        obstacle = CAP_REACHED.to_string();
                    }
                }
                None => {
                    warn!(step, "no advance control on this step, retrying");
                    obstacle = "no advance control within the step cap".to_string();
                }
            }
        }

        Err(ApplyError::StepAdvance {
            step: self.max_steps,
            reason: obstacle,
        })
    }

    /// One step's fill passes. Special fields first, then the engine over
    /// every widget kind. A failed pass is logged and skipped so the rest
    /// of the step still fills.
    async fn fill_step(&self, outcomes: &mut Vec<ResolutionOutcome>) -> Result<(), ApplyError> {
        if let Some(city) = &self.special.home_city {
            if let Err(e) = special::insert_home_city(self.page, city).await {
                warn!(%e, "home-city insert failed");
            }
        }
        if let Some(phone) = &self.special.phone {
            if let Err(e) = special::insert_phone(self.page, phone).await {
                warn!(%e, "phone insert failed");
            }
        }
        if let Err(e) = special::uncheck_follow_company(self.page).await {
            warn!(%e, "follow-company uncheck failed");
        }
        if let Err(e) = special::upload_documents(self.page, self.special).await {
            warn!(%e, "document upload failed");
        }

        for kind in PASS_ORDER {
            let fields = match engine::scan(self.page, kind).await {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(%e, ?kind, "scan failed, skipping pass");
                    continue;
                }
            };
            for field in fields {
                if field.is_populated && kind.skip_when_populated() {
                    debug!(label = %field.label, "already populated, skipping");
                    continue;
                }
                let outcome =
                    engine::resolve(self.page, self.oracle, self.context, self.rules, &field)
                        .await;
                outcomes.push(outcome);
            }
        }
        Ok(())
    }
}
