//! In-memory `BrowserPage` used by engine and driver tests. Controls are
//! registered with the selector strings they answer to, so production code
//! paths run unchanged against it.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{BrowserPage, Cookie, Element, PageError, SelectOption};
use crate::selectors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeKind {
    Input,
    Checkbox,
    Radio,
    Select,
    Fieldset,
    Marker,
}

#[derive(Debug, Clone)]
pub struct FakeControl {
    pub id: String,
    pub kind: FakeKind,
    pub selectors: Vec<String>,
    pub label: Option<String>,
    pub value: String,
    pub checked: bool,
    pub options: Vec<SelectOption>,
    pub selected_index: i64,
    pub children: Vec<String>,
    pub group: Option<String>,
    pub text: String,
    pub clicks: u32,
    /// Control stops matching queries once clicked this many times.
    pub remove_after_clicks: Option<u32>,
    /// Control starts matching queries only once the named control has been
    /// clicked this many times. Simulates markup that appears on a later
    /// wizard step.
    pub appears_after_clicks_on: Option<(String, u32)>,
    /// Control stops matching queries once the named control has been
    /// clicked this many times. Combined with `appears_after_clicks_on`
    /// this models transient markup like a validation banner.
    pub disappears_after_clicks_on: Option<(String, u32)>,
    /// Simulate a broken control: reads fail with a driver error.
    pub fail_reads: bool,
}

impl FakeControl {
    pub fn new(id: &str, kind: FakeKind, selector: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            selectors: vec![selector.to_string()],
            label: None,
            value: String::new(),
            checked: false,
            options: Vec::new(),
            selected_index: -1,
            children: Vec::new(),
            group: None,
            text: String::new(),
            clicks: 0,
            remove_after_clicks: None,
            appears_after_clicks_on: None,
            disappears_after_clicks_on: None,
            fail_reads: false,
        }
    }

    fn visible(&self, all: &[FakeControl]) -> bool {
        let clicks_on = |id: &str| all.iter().find(|c| c.id == id).map_or(0, |c| c.clicks);
        if let Some(n) = self.remove_after_clicks {
            if self.clicks >= n {
                return false;
            }
        }
        if let Some((id, n)) = &self.disappears_after_clicks_on {
            if clicks_on(id) >= *n {
                return false;
            }
        }
        if let Some((id, n)) = &self.appears_after_clicks_on {
            return clicks_on(id) >= *n;
        }
        true
    }
}

#[derive(Default)]
struct State {
    controls: Vec<FakeControl>,
    url: String,
    cookies: Vec<Cookie>,
}

#[derive(Default)]
pub struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, control: FakeControl) {
        self.state.lock().unwrap().controls.push(control);
    }

    pub fn add_text_input(&self, id: &str, label: Option<&str>, value: &str) {
        let mut c = FakeControl::new(id, FakeKind::Input, selectors::TEXT_INPUT);
        c.label = label.map(str::to_string);
        c.value = value.to_string();
        self.add(c);
    }

    pub fn add_checkbox(&self, id: &str, label: Option<&str>, checked: bool) {
        let mut c = FakeControl::new(id, FakeKind::Checkbox, selectors::CHECKBOX);
        c.label = label.map(str::to_string);
        c.checked = checked;
        self.add(c);
    }

    /// Fieldset with one radio per `(id, value, label)` entry.
    pub fn add_radio_fieldset(&self, id: &str, legend: Option<&str>, radios: &[(&str, &str, &str)]) {
        let mut fieldset = FakeControl::new(id, FakeKind::Fieldset, selectors::FIELDSET);
        fieldset.label = legend.map(str::to_string);
        fieldset.children = radios.iter().map(|(rid, _, _)| rid.to_string()).collect();
        self.add(fieldset);

        for (rid, value, label) in radios {
            let mut radio = FakeControl::new(rid, FakeKind::Radio, selectors::RADIO_INPUT);
            radio.value = value.to_string();
            radio.label = Some(label.to_string());
            radio.group = Some(id.to_string());
            self.add(radio);
        }
    }

    /// Select with `(text, value)` options; index 0 starts selected.
    pub fn add_select(&self, id: &str, label: Option<&str>, options: &[(&str, &str)]) {
        let mut c = FakeControl::new(id, FakeKind::Select, selectors::SELECT);
        c.label = label.map(str::to_string);
        c.options = options
            .iter()
            .enumerate()
            .map(|(i, (text, value))| SelectOption {
                text: text.to_string(),
                value: value.to_string(),
                selected: i == 0,
            })
            .collect();
        c.selected_index = if options.is_empty() { -1 } else { 0 };
        self.add(c);
    }

    /// Bare element answering to `selector` (buttons, modals, markers).
    pub fn add_marker(&self, id: &str, selector: &str) {
        self.add(FakeControl::new(id, FakeKind::Marker, selector));
    }

    pub fn with_control<R>(&self, id: &str, f: impl FnOnce(&mut FakeControl) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        let control = state
            .controls
            .iter_mut()
            .find(|c| c.id == id)
            .unwrap_or_else(|| panic!("no fake control {id}"));
        f(control)
    }

    pub fn value_of(&self, id: &str) -> String {
        self.with_control(id, |c| c.value.clone())
    }

    pub fn checked(&self, id: &str) -> bool {
        self.with_control(id, |c| c.checked)
    }

    pub fn clicks(&self, id: &str) -> u32 {
        self.with_control(id, |c| c.clicks)
    }

    /// Value of the currently selected option of a select control.
    pub fn selected_value(&self, id: &str) -> Option<String> {
        self.with_control(id, |c| {
            usize::try_from(c.selected_index)
                .ok()
                .and_then(|i| c.options.get(i))
                .map(|o| o.value.clone())
        })
    }

    fn read<R>(&self, el: &Element, f: impl FnOnce(&FakeControl) -> R) -> Result<R, PageError> {
        let state = self.state.lock().unwrap();
        let control = state
            .controls
            .iter()
            .find(|c| c.id == el.0)
            .ok_or_else(|| PageError::NotFound(el.0.clone()))?;
        if control.fail_reads {
            return Err(PageError::Driver(format!("read failure on {}", el.0)));
        }
        Ok(f(control))
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn query(&self, css: &str) -> Result<Vec<Element>, PageError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .controls
            .iter()
            .filter(|c| c.visible(&state.controls) && c.selectors.iter().any(|s| s == css))
            .map(|c| Element(c.id.clone()))
            .collect())
    }

    async fn query_one(&self, css: &str) -> Result<Option<Element>, PageError> {
        Ok(self.query(css).await?.into_iter().next())
    }

    async fn query_in(&self, scope: &Element, css: &str) -> Result<Vec<Element>, PageError> {
        let state = self.state.lock().unwrap();
        let parent = state
            .controls
            .iter()
            .find(|c| c.id == scope.0)
            .ok_or_else(|| PageError::NotFound(scope.0.clone()))?;
        let children = parent.children.clone();
        Ok(state
            .controls
            .iter()
            .filter(|c| children.contains(&c.id) && c.selectors.iter().any(|s| s == css))
            .map(|c| Element(c.id.clone()))
            .collect())
    }

    async fn matches(&self, el: &Element, css: &str) -> Result<bool, PageError> {
        self.read(el, |c| c.selectors.iter().any(|s| s == css))
    }

    async fn click(&self, el: &Element) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        let idx = state
            .controls
            .iter()
            .position(|c| c.id == el.0)
            .ok_or_else(|| PageError::NotFound(el.0.clone()))?;
        state.controls[idx].clicks += 1;
        match state.controls[idx].kind {
            FakeKind::Checkbox => {
                state.controls[idx].checked = !state.controls[idx].checked;
            }
            FakeKind::Radio => {
                let group = state.controls[idx].group.clone();
                for c in state.controls.iter_mut() {
                    if c.kind == FakeKind::Radio && c.group == group {
                        c.checked = false;
                    }
                }
                state.controls[idx].checked = true;
            }
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self, el: &Element) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        let control = state
            .controls
            .iter_mut()
            .find(|c| c.id == el.0)
            .ok_or_else(|| PageError::NotFound(el.0.clone()))?;
        control.value.clear();
        Ok(())
    }

    async fn type_text(&self, el: &Element, text: &str) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        let control = state
            .controls
            .iter_mut()
            .find(|c| c.id == el.0)
            .ok_or_else(|| PageError::NotFound(el.0.clone()))?;
        control.value.push_str(text);
        Ok(())
    }

    async fn value(&self, el: &Element) -> Result<String, PageError> {
        self.read(el, |c| match c.kind {
            FakeKind::Select => usize::try_from(c.selected_index)
                .ok()
                .and_then(|i| c.options.get(i))
                .map(|o| o.value.clone())
                .unwrap_or_default(),
            _ => c.value.clone(),
        })
    }

    async fn is_checked(&self, el: &Element) -> Result<bool, PageError> {
        self.read(el, |c| c.checked)
    }

    async fn text(&self, el: &Element) -> Result<String, PageError> {
        self.read(el, |c| c.text.clone())
    }

    async fn attr(&self, el: &Element, name: &str) -> Result<Option<String>, PageError> {
        let name = name.to_string();
        self.read(el, move |c| match name.as_str() {
            "href" => Some(c.value.clone()).filter(|v| !v.is_empty()),
            _ => None,
        })
    }

    async fn label_text(&self, el: &Element) -> Result<Option<String>, PageError> {
        self.read(el, |c| c.label.clone())
    }

    async fn options(&self, el: &Element) -> Result<Vec<SelectOption>, PageError> {
        self.read(el, |c| c.options.clone())
    }

    async fn selected_index(&self, el: &Element) -> Result<i64, PageError> {
        self.read(el, |c| c.selected_index)
    }

    async fn select_value(&self, el: &Element, target: &str) -> Result<(), PageError> {
        let mut state = self.state.lock().unwrap();
        let control = state
            .controls
            .iter_mut()
            .find(|c| c.id == el.0)
            .ok_or_else(|| PageError::NotFound(el.0.clone()))?;
        let idx = control
            .options
            .iter()
            .position(|o| o.value == target)
            .ok_or_else(|| PageError::NotFound(format!("option with value {target:?}")))?;
        control.selected_index = idx as i64;
        for (i, o) in control.options.iter_mut().enumerate() {
            o.selected = i == idx;
        }
        Ok(())
    }

    async fn upload_file(&self, el: &Element, path: &str) -> Result<(), PageError> {
        self.type_text(el, path).await
    }

    async fn wait_for(&self, css: &str, _timeout: Duration) -> Result<Element, PageError> {
        self.query_one(css)
            .await?
            .ok_or_else(|| PageError::Timeout(css.to_string()))
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, PageError> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), PageError> {
        self.state.lock().unwrap().cookies.push(cookie.clone());
        Ok(())
    }
}
