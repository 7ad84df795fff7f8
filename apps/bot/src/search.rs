//! Job search: builds the listing-search URL from the configured
//! parameters and collects job leads from the result list.

use anyhow::{Context, Result};
use regex::RegexBuilder;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::browser::BrowserPage;
use crate::selectors;

const SEARCH_BASE: &str = "https://www.linkedin.com/jobs/search/";
const RESULTS_WAIT: std::time::Duration = std::time::Duration::from_secs(10);

/// Workplace filter codes used by the listing search.
const ON_SITE_CODE: &str = "1";
const REMOTE_CODE: &str = "2";
const HYBRID_CODE: &str = "3";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchParams {
    pub keywords: String,
    pub location: String,
    pub remote: bool,
    pub on_site: bool,
    pub hybrid: bool,
    /// Optional case-insensitive pattern a job title must match.
    pub title_pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLead {
    pub url: String,
    pub title: String,
    pub company: String,
}

/// Search URL for one result page. Only easy-apply listings are requested.
pub fn build_search_url(params: &SearchParams, start: u32) -> Result<Url> {
    let mut url = Url::parse(SEARCH_BASE).context("search base URL")?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("keywords", &params.keywords);
        if !params.location.is_empty() {
            query.append_pair("location", &params.location);
        }
        query.append_pair("f_AL", "true");

        let mut codes = Vec::new();
        if params.on_site {
            codes.push(ON_SITE_CODE);
        }
        if params.remote {
            codes.push(REMOTE_CODE);
        }
        if params.hybrid {
            codes.push(HYBRID_CODE);
        }
        if !codes.is_empty() {
            query.append_pair("f_WT", &codes.join(","));
        }

        if start > 0 {
            query.append_pair("start", &start.to_string());
        }
    }
    Ok(url)
}

/// Navigates to one result page and collects its job leads. An empty result
/// list is not an error; the run loop treats it as exhaustion.
pub async fn fetch_job_links(
    page: &dyn BrowserPage,
    params: &SearchParams,
    start: u32,
) -> Result<Vec<JobLead>> {
    let url = build_search_url(params, start)?;
    page.goto(url.as_str()).await?;

    if page.wait_for(selectors::SEARCH_RESULT_LIST, RESULTS_WAIT).await.is_err() {
        warn!(%url, "no result list on search page");
        return Ok(Vec::new());
    }

    let title_filter = match &params.title_pattern {
        Some(pattern) => Some(
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .context("title_pattern is not a valid pattern")?,
        ),
        None => None,
    };

    let mut leads = Vec::new();
    for item in page.query(selectors::SEARCH_RESULT_ITEM).await? {
        let Some(link) = page
            .query_in(&item, selectors::SEARCH_RESULT_ITEM_LINK)
            .await?
            .into_iter()
            .next()
        else {
            continue;
        };
        let title = page.text(&link).await?.trim().to_string();
        let Some(href) = page.attr(&link, "href").await? else {
            continue;
        };
        if let Some(filter) = &title_filter {
            if !filter.is_match(&title) {
                debug!(%title, "title filtered out");
                continue;
            }
        }
        let company = match page
            .query_in(&item, selectors::SEARCH_RESULT_ITEM_COMPANY)
            .await?
            .into_iter()
            .next()
        {
            Some(el) => page.text(&el).await?.trim().to_string(),
            None => "Unknown".to_string(),
        };
        // Listing hrefs are usually relative.
        let absolute = url.join(&href).map(String::from).unwrap_or(href);
        leads.push(JobLead {
            url: absolute,
            title,
            company,
        });
    }

    debug!(count = leads.len(), start, "collected job leads");
    Ok(leads)
}
