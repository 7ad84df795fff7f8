//! W3C WebDriver implementation of `BrowserPage`, speaking plain HTTP to a
//! chromedriver/geckodriver endpoint via `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{BrowserPage, Cookie, Element, PageError, SelectOption};

/// JSON key that wraps element ids on the WebDriver wire.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct WebDriverPage {
    http: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverPage {
    /// Opens a new WebDriver session against `base_url`
    /// (e.g. `http://localhost:9515`).
    pub async fn connect(base_url: &str) -> Result<Self, PageError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(PageError::Http)?;

        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": ["--window-size=1366,768", "--disable-gpu"]
                    }
                }
            }
        });

        let resp: Value = http
            .post(format!("{}/session", base_url.trim_end_matches('/')))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        let session_id = resp["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| PageError::Driver(format!("no sessionId in response: {resp}")))?
            .to_string();

        debug!(%session_id, "webdriver session opened");

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    /// Unwraps the WebDriver `value` envelope, mapping protocol errors.
    fn unwrap_value(status: reqwest::StatusCode, mut payload: Value) -> Result<Value, PageError> {
        if !status.is_success() {
            let error = payload["value"]["error"].as_str().unwrap_or("unknown");
            let message = payload["value"]["message"].as_str().unwrap_or("");
            if error == "no such element" {
                return Err(PageError::NotFound(message.to_string()));
            }
            return Err(PageError::Driver(format!("{error}: {message}")));
        }
        Ok(payload["value"].take())
    }

    async fn get(&self, path: &str) -> Result<Value, PageError> {
        let resp = self.http.get(self.url(path)).send().await?;
        let status = resp.status();
        let payload: Value = resp.json().await?;
        Self::unwrap_value(status, payload)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, PageError> {
        let resp = self.http.post(self.url(path)).json(&body).send().await?;
        let status = resp.status();
        let payload: Value = resp.json().await?;
        Self::unwrap_value(status, payload)
    }

    /// Runs a synchronous script with the given element as `arguments[0]`.
    async fn script(&self, script: &str, args: Vec<Value>) -> Result<Value, PageError> {
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    fn element_arg(el: &Element) -> Value {
        json!({ ELEMENT_KEY: el.0 })
    }

    fn parse_elements(value: &Value) -> Vec<Element> {
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item[ELEMENT_KEY].as_str())
                    .map(|id| Element(id.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl BrowserPage for WebDriverPage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        self.post("/url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        let value = self.get("/url").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn query(&self, css: &str) -> Result<Vec<Element>, PageError> {
        let value = self
            .post("/elements", json!({ "using": "css selector", "value": css }))
            .await?;
        Ok(Self::parse_elements(&value))
    }

    async fn query_one(&self, css: &str) -> Result<Option<Element>, PageError> {
        Ok(self.query(css).await?.into_iter().next())
    }

    async fn query_in(&self, scope: &Element, css: &str) -> Result<Vec<Element>, PageError> {
        let value = self
            .post(
                &format!("/element/{}/elements", scope.0),
                json!({ "using": "css selector", "value": css }),
            )
            .await?;
        Ok(Self::parse_elements(&value))
    }

    async fn matches(&self, el: &Element, css: &str) -> Result<bool, PageError> {
        let value = self
            .script(
                "return arguments[0].matches(arguments[1]);",
                vec![Self::element_arg(el), json!(css)],
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, el: &Element) -> Result<(), PageError> {
        self.post(&format!("/element/{}/click", el.0), json!({})).await?;
        Ok(())
    }

    async fn clear(&self, el: &Element) -> Result<(), PageError> {
        self.post(&format!("/element/{}/clear", el.0), json!({})).await?;
        Ok(())
    }

    async fn type_text(&self, el: &Element, text: &str) -> Result<(), PageError> {
        self.post(&format!("/element/{}/value", el.0), json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn value(&self, el: &Element) -> Result<String, PageError> {
        let value = self.get(&format!("/element/{}/property/value", el.0)).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_checked(&self, el: &Element) -> Result<bool, PageError> {
        let value = self
            .get(&format!("/element/{}/property/checked", el.0))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn text(&self, el: &Element) -> Result<String, PageError> {
        let value = self.get(&format!("/element/{}/text", el.0)).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attr(&self, el: &Element, name: &str) -> Result<Option<String>, PageError> {
        let value = self
            .get(&format!("/element/{}/attribute/{}", el.0, name))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn label_text(&self, el: &Element) -> Result<Option<String>, PageError> {
        let script = r#"
            var el = arguments[0];
            if (el.tagName === 'FIELDSET') {
                var legend = el.querySelector('legend');
                return legend ? legend.innerText : null;
            }
            var wrapping = el.closest('label');
            if (wrapping) { return wrapping.innerText; }
            if (el.id) {
                var forLabel = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
                if (forLabel) { return forLabel.innerText; }
            }
            return null;
        "#;
        let value = self.script(script, vec![Self::element_arg(el)]).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn options(&self, el: &Element) -> Result<Vec<SelectOption>, PageError> {
        let script = r#"
            return Array.from(arguments[0].options).map(function (o) {
                return { text: o.text, value: o.value, selected: o.selected };
            });
        "#;
        let value = self.script(script, vec![Self::element_arg(el)]).await?;
        let options = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|o| SelectOption {
                        text: o["text"].as_str().unwrap_or_default().to_string(),
                        value: o["value"].as_str().unwrap_or_default().to_string(),
                        selected: o["selected"].as_bool().unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(options)
    }

    async fn selected_index(&self, el: &Element) -> Result<i64, PageError> {
        let value = self
            .get(&format!("/element/{}/property/selectedIndex", el.0))
            .await?;
        Ok(value.as_i64().unwrap_or(-1))
    }

    async fn select_value(&self, el: &Element, target: &str) -> Result<(), PageError> {
        let script = r#"
            var select = arguments[0];
            var target = arguments[1];
            var index = Array.from(select.options).findIndex(function (o) {
                return o.value === target;
            });
            if (index < 0) { return false; }
            select.selectedIndex = index;
            select.dispatchEvent(new Event('input', { bubbles: true }));
            select.dispatchEvent(new Event('change', { bubbles: true }));
            return true;
        "#;
        let value = self
            .script(script, vec![Self::element_arg(el), json!(target)])
            .await?;
        if value.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(PageError::NotFound(format!("option with value {target:?}")))
        }
    }

    async fn upload_file(&self, el: &Element, path: &str) -> Result<(), PageError> {
        // File inputs accept the path as keyboard input on the wire.
        self.type_text(el, path).await
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<Element, PageError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(el) = self.query_one(css).await? {
                return Ok(el);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PageError::Timeout(css.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, PageError> {
        let value = self.get("/cookie").await?;
        let cookies = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|c| Cookie {
                        name: c["name"].as_str().unwrap_or_default().to_string(),
                        value: c["value"].as_str().unwrap_or_default().to_string(),
                        domain: c["domain"].as_str().unwrap_or_default().to_string(),
                        path: c["path"].as_str().unwrap_or("/").to_string(),
                        secure: c["secure"].as_bool().unwrap_or(false),
                        http_only: c["httpOnly"].as_bool().unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(cookies)
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), PageError> {
        self.post(
            "/cookie",
            json!({
                "cookie": {
                    "name": cookie.name,
                    "value": cookie.value,
                    "domain": cookie.domain,
                    "path": cookie.path,
                    "secure": cookie.secure,
                    "httpOnly": cookie.http_only,
                }
            }),
        )
        .await?;
        Ok(())
    }
}
