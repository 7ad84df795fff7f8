//! Special-cased form elements handled outside the decision engine: home
//! city and phone inserts, the follow-company checkbox, and document
//! uploads. Each pass is best-effort; the step driver logs failures and
//! keeps going.

use std::path::Path;

use tracing::{debug, warn};

use crate::browser::{BrowserPage, PageError};
use crate::selectors;

/// Applicant data the special passes need. Built from the profile; every
/// field is optional so a sparse profile simply skips the pass.
#[derive(Debug, Clone, Default)]
pub struct SpecialFields {
    pub home_city: Option<String>,
    pub phone: Option<String>,
    pub cv_path: Option<String>,
    pub cover_letter_path: Option<String>,
}

/// Fills the home-city input when the current step shows one.
pub async fn insert_home_city(page: &dyn BrowserPage, city: &str) -> Result<bool, PageError> {
    fill_if_present(page, selectors::HOME_CITY_INPUT, city).await
}

/// Fills the phone-number input when the current step shows one.
pub async fn insert_phone(page: &dyn BrowserPage, phone: &str) -> Result<bool, PageError> {
    fill_if_present(page, selectors::PHONE_INPUT, phone).await
}

async fn fill_if_present(
    page: &dyn BrowserPage,
    css: &str,
    value: &str,
) -> Result<bool, PageError> {
    match page.query_one(css).await? {
        Some(input) => {
            page.clear(&input).await?;
            page.type_text(&input, value).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Unchecks the follow-company checkbox. Idempotent: clicks only when the
/// box is currently checked.
pub async fn uncheck_follow_company(page: &dyn BrowserPage) -> Result<(), PageError> {
    if let Some(checkbox) = page.query_one(selectors::FOLLOW_COMPANY_CHECKBOX).await? {
        if page.is_checked(&checkbox).await? {
            page.click(&checkbox).await?;
            debug!("unchecked follow-company");
        }
    }
    Ok(())
}

/// Sends the CV and cover letter into any file inputs on the current step.
/// The input's label decides which document it takes; an input whose label
/// mentions a cover letter gets the cover letter, everything else gets the
/// CV. Returns how many uploads happened.
pub async fn upload_documents(
    page: &dyn BrowserPage,
    fields: &SpecialFields,
) -> Result<u32, PageError> {
    let mut uploaded = 0;
    for input in page.query(selectors::DOCUMENT_UPLOAD_INPUT).await? {
        let label = page.label_text(&input).await?.unwrap_or_default();
        let wants_cover_letter = label.to_lowercase().contains("cover");
        let path = if wants_cover_letter {
            fields.cover_letter_path.as_deref()
        } else {
            fields.cv_path.as_deref()
        };
        let Some(path) = path else {
            warn!(%label, "document requested but not configured");
            continue;
        };
        if !Path::new(path).exists() {
            warn!(%path, "configured document does not exist, skipping upload");
            continue;
        }
        page.upload_file(&input, path).await?;
        debug!(%label, %path, "uploaded document");
        uploaded += 1;
    }
    Ok(uploaded)
}
