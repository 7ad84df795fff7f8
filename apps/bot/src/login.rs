//! Login flow. A cached session cookie from the store is tried first; only
//! when that fails (missing, expired, or rejected by the site) does the
//! flow fall back to the login form, pausing for the operator if a captcha
//! shows up. A fresh cookie is persisted with a one-year expiry.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::browser::{BrowserPage, Cookie};
use crate::db::{SessionStore, SessionToken, SESSION_TTL_DAYS};
use crate::jitter;
use crate::selectors;

pub const BASE_URL: &str = "https://www.linkedin.com";
const LOGIN_URL: &str = "https://www.linkedin.com/login";
const FEED_URL: &str = "https://www.linkedin.com/feed/";
const SESSION_COOKIE: &str = "li_at";
const LOGIN_WAIT: Duration = Duration::from_secs(10);

pub struct LoginFlow<'a> {
    page: &'a dyn BrowserPage,
    store: &'a dyn SessionStore,
    email: &'a str,
    password: &'a str,
}

impl<'a> LoginFlow<'a> {
    pub fn new(
        page: &'a dyn BrowserPage,
        store: &'a dyn SessionStore,
        email: &'a str,
        password: &'a str,
    ) -> Self {
        Self {
            page,
            store,
            email,
            password,
        }
    }

    pub async fn login(&self) -> Result<()> {
        if let Some(token) = self.store.get(self.email).await? {
            if token.is_expired() {
                info!("cached session expired, discarding");
                self.store.invalidate(self.email).await?;
            } else if self.try_cookie(&token).await? {
                info!("session restored from cached cookie");
                return Ok(());
            } else {
                warn!("cached cookie rejected, discarding");
                self.store.invalidate(self.email).await?;
            }
        }

        self.form_login().await?;
        self.persist_cookie().await?;
        info!("logged in via form, session cookie cached");
        Ok(())
    }

    async fn try_cookie(&self, token: &SessionToken) -> Result<bool> {
        self.page.goto(BASE_URL).await?;
        self.page
            .add_cookie(&Cookie {
                name: SESSION_COOKIE.to_string(),
                value: token.value.clone(),
                domain: ".linkedin.com".to_string(),
                path: "/".to_string(),
                secure: true,
                http_only: true,
            })
            .await?;
        self.page.goto(FEED_URL).await?;
        self.is_logged_in().await
    }

    async fn is_logged_in(&self) -> Result<bool> {
        for css in selectors::AUTH_INDICATORS {
            if self.page.query_one(css).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn form_login(&self) -> Result<()> {
        self.page.goto(LOGIN_URL).await?;
        let email_input = self
            .page
            .wait_for(selectors::EMAIL_INPUT, LOGIN_WAIT)
            .await
            .context("login form did not load")?;
        self.page.type_text(&email_input, self.email).await?;
        jitter::small_random_delay().await;

        let password_input = self
            .page
            .query_one(selectors::PASSWORD_INPUT)
            .await?
            .context("password input missing on login form")?;
        self.page.type_text(&password_input, self.password).await?;

        let submit = self
            .page
            .query_one(selectors::LOGIN_SUBMIT)
            .await?
            .context("login submit control missing")?;
        self.page.click(&submit).await?;
        jitter::random_delay().await;

        if self.page.query_one(selectors::CAPTCHA).await?.is_some() {
            self.wait_for_operator().await?;
        }

        // Onboarding interstitials sometimes offer a skip control.
        if let Some(skip) = self.page.query_one(selectors::SKIP_BUTTON).await? {
            let _ = self.page.click(&skip).await;
        }

        if !self.is_logged_in().await? {
            bail!("login failed for {}", self.email);
        }
        Ok(())
    }

    /// Blocks until the operator confirms the captcha is solved.
    async fn wait_for_operator(&self) -> Result<()> {
        warn!("captcha detected, solve it in the browser then press Enter");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("reading operator confirmation")?;
        Ok(())
    }

    async fn persist_cookie(&self) -> Result<()> {
        let cookie = self
            .page
            .cookies()
            .await?
            .into_iter()
            .find(|c| c.name == SESSION_COOKIE)
            .context("session cookie not present after login")?;
        self.store
            .save(
                self.email,
                &SessionToken {
                    value: cookie.value,
                    expires_at: Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::browser::fake::{FakeControl, FakeKind, FakePage};

    #[derive(Default)]
    struct MemStore {
        token: Mutex<Option<SessionToken>>,
        saves: Mutex<u32>,
    }

    #[async_trait]
    impl SessionStore for MemStore {
        async fn get(&self, _email: &str) -> Result<Option<SessionToken>> {
            Ok(self.token.lock().unwrap().clone())
        }

        async fn save(&self, _email: &str, token: &SessionToken) -> Result<()> {
            *self.token.lock().unwrap() = Some(token.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }

        async fn invalidate(&self, _email: &str) -> Result<()> {
            *self.token.lock().unwrap() = None;
            Ok(())
        }
    }

    fn add_login_form(page: &FakePage) {
        page.add(FakeControl::new("email", FakeKind::Input, selectors::EMAIL_INPUT));
        page.add(FakeControl::new("password", FakeKind::Input, selectors::PASSWORD_INPUT));
        page.add(FakeControl::new("go", FakeKind::Marker, selectors::LOGIN_SUBMIT));
        // Logged-in chrome appears once the form is submitted.
        let mut nav = FakeControl::new("nav", FakeKind::Marker, selectors::AUTH_INDICATORS[0]);
        nav.appears_after_clicks_on = Some(("go".to_string(), 1));
        page.add(nav);
    }

    #[tokio::test(start_paused = true)]
    async fn valid_cached_cookie_skips_the_form() {
        let page = FakePage::new();
        page.add_marker("nav", selectors::AUTH_INDICATORS[0]);
        let store = MemStore::default();
        *store.token.lock().unwrap() = Some(SessionToken {
            value: "cached".to_string(),
            expires_at: Utc::now() + ChronoDuration::days(30),
        });

        LoginFlow::new(&page, &store, "a@b.c", "pw").login().await.unwrap();

        let cookies = page.cookies().await.unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "cached");
        assert_eq!(*store.saves.lock().unwrap(), 0, "no re-save on restore");
    }

    #[tokio::test(start_paused = true)]
    async fn expired_cookie_is_invalidated_and_form_login_runs() {
        let page = FakePage::new();
        add_login_form(&page);
        let store = MemStore::default();
        *store.token.lock().unwrap() = Some(SessionToken {
            value: "stale".to_string(),
            expires_at: Utc::now() - ChronoDuration::hours(1),
        });
        // The browser ends up holding a fresh cookie after form login.
        page.add_cookie(&Cookie {
            name: SESSION_COOKIE.to_string(),
            value: "fresh".to_string(),
            domain: ".linkedin.com".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
        })
        .await
        .unwrap();

        LoginFlow::new(&page, &store, "a@b.c", "pw").login().await.unwrap();

        assert_eq!(page.value_of("email"), "a@b.c");
        assert_eq!(page.value_of("password"), "pw");
        let saved = store.token.lock().unwrap().clone().unwrap();
        assert_eq!(saved.value, "fresh");
        assert!(saved.expires_at > Utc::now() + ChronoDuration::days(SESSION_TTL_DAYS - 1));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_form_login_is_an_error() {
        let page = FakePage::new();
        page.add(FakeControl::new("email", FakeKind::Input, selectors::EMAIL_INPUT));
        page.add(FakeControl::new("password", FakeKind::Input, selectors::PASSWORD_INPUT));
        page.add(FakeControl::new("go", FakeKind::Marker, selectors::LOGIN_SUBMIT));
        // No auth indicator ever appears.
        let store = MemStore::default();

        let err = LoginFlow::new(&page, &store, "a@b.c", "bad")
            .login()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("login failed"));
    }
}
