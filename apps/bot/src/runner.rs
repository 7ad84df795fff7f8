//! The run loop: fetch job leads, apply to each, record every outcome, and
//! keep going until the applied-count limit or the listings run out. One
//! bad application never stops the run.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::apply::{SpecialFields, WizardDriver};
use crate::browser::BrowserPage;
use crate::control::PauseControl;
use crate::db::{ApplicationLog, ApplicationRecord, ApplyStatus};
use crate::engine::RuleSet;
use crate::jitter;
use crate::llm_client::Oracle;
use crate::search::{self, JobLead, SearchParams};

/// Result-page size used when paging deeper into the listings.
const PAGE_SIZE: u32 = 25;

pub struct Runner<'a> {
    page: &'a dyn BrowserPage,
    oracle: &'a dyn Oracle,
    log: &'a dyn ApplicationLog,
    pause: &'a PauseControl,
    rules: &'a RuleSet,
    context: &'a Value,
    special: &'a SpecialFields,
    search: &'a SearchParams,
    identity: &'a str,
    limit: u32,
    max_steps: u32,
    submit: bool,
}

impl<'a> Runner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        page: &'a dyn BrowserPage,
        oracle: &'a dyn Oracle,
        log: &'a dyn ApplicationLog,
        pause: &'a PauseControl,
        rules: &'a RuleSet,
        context: &'a Value,
        special: &'a SpecialFields,
        search: &'a SearchParams,
        identity: &'a str,
        limit: u32,
        max_steps: u32,
        submit: bool,
    ) -> Self {
        Self {
            page,
            oracle,
            log,
            pause,
            rules,
            context,
            special,
            search,
            identity,
            limit,
            max_steps,
            submit,
        }
    }

    /// Runs until the applied-count limit is reached or the listings are
    /// exhausted. Returns the number of submitted applications.
    pub async fn run(&self) -> anyhow::Result<u32> {
        let mut applied = 0u32;
        let mut start = 0u32;
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<JobLead> = VecDeque::new();

        self.refill(&mut queue, &mut seen, start).await?;

        while applied < self.limit {
            let Some(lead) = queue.pop_front() else {
                start += PAGE_SIZE;
                self.refill(&mut queue, &mut seen, start).await?;
                if queue.is_empty() {
                    info!("listings exhausted");
                    break;
                }
                continue;
            };

            self.pause.checkpoint().await;

            match self.log.has_applied(&lead.url).await {
                Ok(true) => {
                    debug!(url = %lead.url, "already applied, skipping");
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!(%e, "application log lookup failed"),
            }

            jitter::random_delay().await;
            info!(title = %lead.title, company = %lead.company, "applying");

            let driver = WizardDriver::new(
                self.page,
                self.oracle,
                self.rules,
                self.context,
                self.special,
                self.pause,
                self.max_steps,
                self.submit,
            );
            match driver.apply(&lead.url).await {
                Ok(report) if report.submitted => {
                    applied += 1;
                    self.record(&lead, ApplyStatus::Applied).await;
                    info!(applied, limit = self.limit, "application recorded");
                }
                Ok(_) => {
                    info!(url = %lead.url, "dry run, not recorded");
                }
                Err(e) => {
                    error!(url = %lead.url, %e, "application failed");
                    self.record(&lead, ApplyStatus::Error).await;
                }
            }
        }

        Ok(applied)
    }

    /// Fetches the next result page, dropping leads already queued this
    /// run. Duplicate-only pages leave the queue empty, which ends the run.
    async fn refill(
        &self,
        queue: &mut VecDeque<JobLead>,
        seen: &mut HashSet<String>,
        start: u32,
    ) -> anyhow::Result<()> {
        for lead in search::fetch_job_links(self.page, self.search, start).await? {
            if seen.insert(lead.url.clone()) {
                queue.push_back(lead);
            }
        }
        Ok(())
    }

    /// Best-effort write; a log failure is not worth stopping the run over.
    async fn record(&self, lead: &JobLead, status: ApplyStatus) {
        let entry = ApplicationRecord {
            job_title: &lead.title,
            company: &lead.company,
            job_url: &lead.url,
            identity: self.identity,
            status,
        };
        if let Err(e) = self.log.record(&entry).await {
            warn!(url = %lead.url, %e, "failed to record application");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::browser::fake::{FakeControl, FakeKind, FakePage};
    use crate::llm_client::{OracleError, OracleRequest};
    use crate::selectors;

    struct NoOracle;

    #[async_trait]
    impl Oracle for NoOracle {
        async fn answer(&self, _request: OracleRequest<'_>) -> Result<String, OracleError> {
            Err(OracleError::EmptyContent)
        }
    }

    #[derive(Default)]
    struct MemLog {
        records: Mutex<Vec<(String, ApplyStatus)>>,
    }

    #[async_trait]
    impl ApplicationLog for MemLog {
        async fn record(&self, entry: &ApplicationRecord<'_>) -> anyhow::Result<()> {
            self.records
                .lock()
                .unwrap()
                .push((entry.job_url.to_string(), entry.status));
            Ok(())
        }

        async fn has_applied(&self, job_url: &str) -> anyhow::Result<bool> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .any(|(url, status)| url == job_url && *status == ApplyStatus::Applied))
        }
    }

    fn add_result(page: &FakePage, id: &str, title: &str, href: &str) {
        let link_id = format!("{id}-link");
        let mut item = FakeControl::new(id, FakeKind::Marker, selectors::SEARCH_RESULT_ITEM);
        item.children = vec![link_id.clone()];
        page.add(item);
        let mut link =
            FakeControl::new(&link_id, FakeKind::Marker, selectors::SEARCH_RESULT_ITEM_LINK);
        link.text = title.to_string();
        link.value = href.to_string();
        page.add(link);
    }

    fn add_submittable_form(page: &FakePage) {
        page.add_marker("apply", selectors::EASY_APPLY_BUTTON);
        page.add_marker("submit", selectors::SUBMIT_BUTTON);
        let mut modal = FakeControl::new("modal", FakeKind::Marker, selectors::POST_APPLY_MODAL);
        modal.appears_after_clicks_on = Some(("submit".to_string(), 1));
        page.add(modal);
    }

    struct Fixture {
        oracle: NoOracle,
        log: MemLog,
        pause: PauseControl,
        rules: RuleSet,
        context: Value,
        special: SpecialFields,
        search: SearchParams,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                oracle: NoOracle,
                log: MemLog::default(),
                pause: PauseControl::new(),
                rules: RuleSet::default(),
                context: json!({}),
                special: SpecialFields::default(),
                search: SearchParams {
                    keywords: "rust".to_string(),
                    ..Default::default()
                },
            }
        }

        fn runner<'a>(&'a self, page: &'a FakePage, limit: u32) -> Runner<'a> {
            Runner::new(
                page,
                &self.oracle,
                &self.log,
                &self.pause,
                &self.rules,
                &self.context,
                &self.special,
                &self.search,
                "a@b.c",
                limit,
                5,
                true,
            )
        }
    }

    #[tokio::test(start_paused = true)]
    async fn limit_stops_the_run_and_records_applications() {
        let page = FakePage::new();
        page.add_marker("list", selectors::SEARCH_RESULT_LIST);
        add_result(&page, "r1", "Rust Engineer", "/jobs/view/1");
        add_result(&page, "r2", "Rust Developer", "/jobs/view/2");
        add_submittable_form(&page);
        let fixture = Fixture::new();

        let applied = fixture.runner(&page, 1).run().await.unwrap();

        assert_eq!(applied, 1);
        let records = fixture.log.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, ApplyStatus::Applied);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_applications_are_recorded_and_the_run_continues() {
        let page = FakePage::new();
        page.add_marker("list", selectors::SEARCH_RESULT_LIST);
        add_result(&page, "r1", "Rust Engineer", "/jobs/view/1");
        add_result(&page, "r2", "Rust Developer", "/jobs/view/2");
        // No easy-apply control anywhere: every attempt fails.
        let fixture = Fixture::new();

        let applied = fixture.runner(&page, 5).run().await.unwrap();

        assert_eq!(applied, 0);
        let records = fixture.log.records.lock().unwrap();
        assert_eq!(records.len(), 2, "both failures recorded");
        assert!(records.iter().all(|(_, status)| *status == ApplyStatus::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_only_refills_end_the_run() {
        // The fake search page always returns the same two leads; after
        // both fail the refill yields nothing new and the run stops.
        let page = FakePage::new();
        page.add_marker("list", selectors::SEARCH_RESULT_LIST);
        add_result(&page, "r1", "Rust Engineer", "/jobs/view/1");
        add_result(&page, "r2", "Rust Developer", "/jobs/view/2");
        let fixture = Fixture::new();

        let applied = fixture.runner(&page, 10).run().await.unwrap();
        assert_eq!(applied, 0);
    }
}
