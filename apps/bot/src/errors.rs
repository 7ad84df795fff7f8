use thiserror::Error;

use crate::browser::PageError;

/// Failure of one whole application attempt. Propagates to the run loop,
/// which records it and moves on to the next job. Never terminates the run.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("easy-apply control not found on {url}")]
    NoApplyButton { url: String },

    #[error("no post-apply confirmation found for {url}")]
    NoConfirmation { url: String },

    #[error("could not advance past wizard step {step}: {reason}")]
    StepAdvance { step: u32, reason: String },

    #[error("browser error: {0}")]
    Page(#[from] PageError),
}

/// Failure resolving a single form field. Swallowed by the pipeline: the
/// field is left in the state it was found and sibling fields still run.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("no applicable option for \"{label}\"")]
    NoOption { label: String },

    #[error("browser error: {0}")]
    Page(#[from] PageError),
}
