//! Browser driver seam. The engine only ever talks to a page through the
//! `BrowserPage` trait: enumerate elements, read labels, read/write values
//! and checked state, enumerate select options, click, navigate, wait.
//!
//! `webdriver.rs` is the production implementation (W3C WebDriver over
//! HTTP); `fake.rs` is the in-memory page the engine tests run against.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod webdriver;

#[cfg(test)]
pub mod fake;

/// Opaque handle to a DOM element, owned by the page that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element(pub String);

/// One `<option>` of a select control, in DOM order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webdriver error: {0}")]
    Driver(String),

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),
}

/// DOM query and interaction primitives. Operations against one page are
/// strictly sequential; the engine never holds two in flight.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), PageError>;
    async fn current_url(&self) -> Result<String, PageError>;

    /// All elements matching `css`, in DOM encounter order.
    async fn query(&self, css: &str) -> Result<Vec<Element>, PageError>;
    async fn query_one(&self, css: &str) -> Result<Option<Element>, PageError>;
    /// Elements matching `css` inside `scope` (fieldset radios, list items).
    async fn query_in(&self, scope: &Element, css: &str) -> Result<Vec<Element>, PageError>;
    /// Whether `el` itself matches `css`. Used for exclusion rules.
    async fn matches(&self, el: &Element, css: &str) -> Result<bool, PageError>;

    async fn click(&self, el: &Element) -> Result<(), PageError>;
    async fn clear(&self, el: &Element) -> Result<(), PageError>;
    async fn type_text(&self, el: &Element, text: &str) -> Result<(), PageError>;

    /// Current `value` property (inputs, textareas, selects).
    async fn value(&self, el: &Element) -> Result<String, PageError>;
    async fn is_checked(&self, el: &Element) -> Result<bool, PageError>;
    /// Visible text content of the element.
    async fn text(&self, el: &Element) -> Result<String, PageError>;
    /// Attribute value, if present.
    async fn attr(&self, el: &Element, name: &str) -> Result<Option<String>, PageError>;

    /// Label text associated with a control: wrapping `<label>`,
    /// `label[for=id]`, or a fieldset's `<legend>`. `None` when unresolvable.
    async fn label_text(&self, el: &Element) -> Result<Option<String>, PageError>;

    /// Options of a select, in DOM order (placeholder included).
    async fn options(&self, el: &Element) -> Result<Vec<SelectOption>, PageError>;
    /// Index of the currently selected option, `-1` when none.
    async fn selected_index(&self, el: &Element) -> Result<i64, PageError>;
    /// Select the option whose `value` matches, firing change events.
    async fn select_value(&self, el: &Element, value: &str) -> Result<(), PageError>;

    /// Feed a local file path to a file input.
    async fn upload_file(&self, el: &Element, path: &str) -> Result<(), PageError>;

    /// Poll for `css` until it appears or `timeout` elapses.
    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<Element, PageError>;

    async fn cookies(&self) -> Result<Vec<Cookie>, PageError>;
    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), PageError>;
}
