//! Configuration: secrets from environment variables, everything about the
//! applicant from a JSON profile file. Rule patterns are compiled here so
//! a malformed profile fails at startup, not mid-run.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::apply::SpecialFields;
use crate::engine::RuleSet;
use crate::llm_client::DEFAULT_MODEL;
use crate::search::SearchParams;

const DEFAULT_LLM_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Environment-sourced configuration. Secrets only; applicant data lives in
/// the profile.
#[derive(Debug, Clone)]
pub struct Config {
    pub account_email: String,
    pub account_password: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub webdriver_url: String,
    pub database_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            account_email: require_env("ACCOUNT_EMAIL")?,
            account_password: require_env("ACCOUNT_PASSWORD")?,
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            webdriver_url: std::env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string()),
            database_url: require_env("DATABASE_URL")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// One configured rule: a label pattern and the value to apply when it
/// matches. Profile tables are JSON arrays of these, so insertion order is
/// the precedence order.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntry<V> {
    pub pattern: String,
    pub value: V,
}

/// Applicant profile, deserialized from JSON.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Profile {
    pub phone: Option<String>,
    pub home_city: Option<String>,
    pub cv_path: Option<String>,
    pub cover_letter_path: Option<String>,
    pub requires_visa_sponsorship: bool,

    pub booleans: Vec<RuleEntry<bool>>,
    pub text: Vec<RuleEntry<String>>,
    pub multiple_choice: Vec<RuleEntry<String>>,
    /// Merged into both the text and multiple-choice tables.
    pub years_of_experience: Vec<RuleEntry<u32>>,
    /// Language proficiency, merged like years of experience.
    pub languages: Vec<RuleEntry<String>>,

    pub search: SearchParams,
    /// Free-form applicant description handed to the oracle as context.
    pub applicant: serde_json::Value,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing profile {}", path.display()))
    }

    /// Compiles the profile's tables into the engine's `RuleSet`. Explicit
    /// entries come first in each table; the merged categories follow, and
    /// the visa-sponsorship boolean goes last so explicit entries win.
    pub fn build_rule_set(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::default();

        for entry in &self.booleans {
            push_bool(&mut rules, &entry.pattern, entry.value)?;
        }

        for entry in &self.text {
            push_text(&mut rules, &entry.pattern, entry.value.clone())?;
        }
        for entry in &self.multiple_choice {
            push_choice(&mut rules, &entry.pattern, entry.value.clone())?;
        }

        for entry in &self.years_of_experience {
            let value = entry.value.to_string();
            push_text(&mut rules, &entry.pattern, value.clone())?;
            push_choice(&mut rules, &entry.pattern, value)?;
        }
        for entry in &self.languages {
            push_text(&mut rules, &entry.pattern, entry.value.clone())?;
            push_choice(&mut rules, &entry.pattern, entry.value.clone())?;
        }

        push_bool(&mut rules, "sponsor", self.requires_visa_sponsorship)?;

        Ok(rules)
    }

    pub fn special_fields(&self) -> SpecialFields {
        SpecialFields {
            home_city: self.home_city.clone(),
            phone: self.phone.clone(),
            cv_path: self.cv_path.clone(),
            cover_letter_path: self.cover_letter_path.clone(),
        }
    }

    pub fn oracle_context(&self) -> serde_json::Value {
        self.applicant.clone()
    }
}

fn push_bool(rules: &mut RuleSet, pattern: &str, value: bool) -> Result<()> {
    rules
        .booleans
        .push(pattern, value)
        .with_context(|| format!("invalid boolean rule pattern {pattern:?}"))
}

fn push_text(rules: &mut RuleSet, pattern: &str, value: String) -> Result<()> {
    rules
        .text
        .push(pattern, value)
        .with_context(|| format!("invalid text rule pattern {pattern:?}"))
}

fn push_choice(rules: &mut RuleSet, pattern: &str, value: String) -> Result<()> {
    rules
        .multiple_choice
        .push(pattern, value)
        .with_context(|| format!("invalid multiple-choice rule pattern {pattern:?}"))
}
