//! CSS selector table for the networking site's login, search, and
//! easy-apply surfaces. Kept in one place so markup churn is a one-file fix.

// Easy-apply form
pub const TEXT_INPUT: &str =
    ".jobs-easy-apply-modal input[type='text'], .jobs-easy-apply-modal textarea";
pub const FIELDSET: &str = ".jobs-easy-apply-modal fieldset";
pub const RADIO_INPUT: &str = "input[type='radio']";
pub const CHECKBOX: &str = ".jobs-easy-apply-modal input[type='checkbox']";
pub const SELECT: &str = ".fb-dash-form-element__select-dropdown";
pub const FOLLOW_COMPANY_CHECKBOX: &str = "input[type='checkbox']#follow-company-checkbox";
pub const HOME_CITY_INPUT: &str =
    ".jobs-easy-apply-modal input[id*='easyApplyFormElement'][id*='city-HOME-CITY']";
pub const PHONE_INPUT: &str =
    ".jobs-easy-apply-modal input[id*='easyApplyFormElement'][id*='phoneNumber']";
pub const DOCUMENT_UPLOAD_INPUT: &str = "input[type='file'][id*='jobs-document-upload']";

pub const EASY_APPLY_BUTTON: &str = "#jobs-apply-button-id";
pub const NEXT_BUTTON: &str =
    "button.artdeco-button.artdeco-button--2.artdeco-button--primary.ember-view";
pub const SUBMIT_BUTTON: &str = ".jobs-easy-apply-modal footer button[aria-label*='Submit']";
pub const POST_APPLY_MODAL: &str = "#post-apply-modal";
pub const VALIDATION_ERROR: &str = ".jobs-easy-apply-modal .artdeco-inline-feedback--error";

// Login
pub const CAPTCHA: &str = "#captcha-internal";
pub const EMAIL_INPUT: &str = "#username";
pub const PASSWORD_INPUT: &str = "#password";
pub const LOGIN_SUBMIT: &str = "button.btn__primary--large.from__button--floating";
pub const SKIP_BUTTON: &str = "button[text()='Skip']";
pub const AUTH_INDICATORS: &[&str] = &[
    "nav.global-nav",
    "[data-control-name=\"nav.settings\"]",
    ".global-nav__me",
    ".feed-identity-module",
];

// Job search
pub const SEARCH_RESULT_LIST: &str = ".scaffold-layout__list ul";
pub const SEARCH_RESULT_ITEM: &str = ".scaffold-layout__list ul li";
pub const SEARCH_RESULT_ITEM_LINK: &str = "a.job-card-list__title";
pub const SEARCH_RESULT_ITEM_COMPANY: &str =
    ".job-details-jobs-unified-top-card__company-name a";
