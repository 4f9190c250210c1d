//! Orchestrator: sweeps every (category, kind) pair through fetch, filter, format and dispatch

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{Config, FetchErrorPolicy};
use crate::dispatcher::WebhookDispatcher;
use crate::fetcher::RecordFetcher;
use crate::filter::{self, IgnoreSet};
use crate::formatter::AlertFormatter;
use crate::io::HttpClient;
use crate::model::{NodeCategory, RecordKind};

/// Endpoint and suppression settings for one category, resolved once
#[derive(Debug, Clone)]
struct CategorySettings {
    base_url: String,
    api_key: String,
    ignore: IgnoreSet,
}

/// What happened to one (category, kind) pair during a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub category: NodeCategory,
    pub kind: RecordKind,
    pub found: usize,
    pub suppressed: usize,
    pub delivered: usize,
    pub failed: usize,
    pub fetch_error: Option<String>,
}

impl PairReport {
    fn new(category: NodeCategory, kind: RecordKind) -> Self {
        Self {
            category,
            kind,
            found: 0,
            suppressed: 0,
            delivered: 0,
            failed: 0,
            fetch_error: None,
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub pairs: Vec<PairReport>,
}

impl RunReport {
    pub fn delivered(&self) -> usize {
        self.pairs.iter().map(|p| p.delivered).sum()
    }

    pub fn failed_deliveries(&self) -> usize {
        self.pairs.iter().map(|p| p.failed).sum()
    }

    pub fn fetch_failures(&self) -> usize {
        self.pairs.iter().filter(|p| p.fetch_error.is_some()).count()
    }

    /// Whether any fetch or delivery failed
    pub fn has_failures(&self) -> bool {
        self.failed_deliveries() > 0 || self.fetch_failures() > 0
    }

    /// `Incomplete` when anything failed, so the process can exit non-zero
    pub fn ensure_complete(&self) -> crate::Result<()> {
        if !self.has_failures() {
            return Ok(());
        }
        Err(crate::NodewatchError::Incomplete(format!(
            "{} delivery failure(s), {} fetch failure(s)",
            self.failed_deliveries(),
            self.fetch_failures()
        )))
    }
}

/// Drives the fixed sweep over every category and record kind
pub struct PollOrchestrator {
    fetcher: RecordFetcher,
    formatter: AlertFormatter,
    dispatcher: WebhookDispatcher,
    categories: HashMap<NodeCategory, CategorySettings>,
    on_fetch_error: FetchErrorPolicy,
}

impl PollOrchestrator {
    pub fn new(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let categories = NodeCategory::ALL
            .into_iter()
            .map(|category| {
                let settings = config.category(category);
                let ignore = IgnoreSet::new(settings.ignore.iter().flatten().copied());
                tracing::debug!("Ignoring {} {} node id(s)", ignore.len(), category);
                (
                    category,
                    CategorySettings {
                        base_url: settings.base_url.clone(),
                        api_key: settings.api_key.clone(),
                        ignore,
                    },
                )
            })
            .collect();

        Self {
            fetcher: RecordFetcher::new(Arc::clone(&http), config.fetch.page_size),
            formatter: AlertFormatter::new(config),
            dispatcher: WebhookDispatcher::new(config.webhook.url.clone(), http),
            categories,
            on_fetch_error: config.fetch.on_error,
        }
    }

    /// Run the sweep once.
    ///
    /// With [`FetchErrorPolicy::Abort`] the first failed fetch ends the run
    /// with that error; with [`FetchErrorPolicy::Continue`] it is recorded in
    /// the report and the remaining pairs still run.
    pub async fn run(&self) -> crate::Result<RunReport> {
        let mut report = RunReport::default();

        for category in NodeCategory::ALL {
            for kind in RecordKind::ALL {
                match self.sweep_pair(category, kind).await {
                    Ok(pair) => report.pairs.push(pair),
                    Err(e) => {
                        if self.on_fetch_error == FetchErrorPolicy::Abort {
                            tracing::error!(
                                "Fetching open {} {} records failed, aborting run: {}",
                                category,
                                kind,
                                e
                            );
                            return Err(e);
                        }
                        tracing::error!(
                            "Fetching open {} {} records failed, continuing: {}",
                            category,
                            kind,
                            e
                        );
                        let mut pair = PairReport::new(category, kind);
                        pair.fetch_error = Some(e.to_string());
                        report.pairs.push(pair);
                    }
                }
            }
        }

        tracing::info!(
            "Run complete: {} delivered, {} failed deliveries, {} failed fetches",
            report.delivered(),
            report.failed_deliveries(),
            report.fetch_failures()
        );
        Ok(report)
    }

    /// Process one pair. Only a fetch failure is returned as an error;
    /// delivery failures are counted in the report.
    pub async fn sweep_pair(
        &self,
        category: NodeCategory,
        kind: RecordKind,
    ) -> crate::Result<PairReport> {
        let settings = self.settings(category)?;
        let mut pair = PairReport::new(category, kind);

        tracing::info!("Checking for open {} node {}s", category, kind);
        let raw = self
            .fetcher
            .fetch(&settings.base_url, kind, &settings.api_key)
            .await?;

        let filtered = filter::apply(&raw, &settings.ignore, kind);
        pair.found = filtered.records.len();
        pair.suppressed = filtered.suppressed;
        if filtered.suppressed > 0 {
            tracing::info!(
                "Suppressed {} ignored {} node {}(s)",
                filtered.suppressed,
                category,
                kind
            );
        }

        if filtered.records.is_empty() {
            tracing::info!("No open {} node {}s", category, kind);
            return Ok(pair);
        }

        tracing::info!(
            "{} open {} node {}(s) detected, alerting",
            filtered.records.len(),
            category,
            kind
        );

        let payloads = self.formatter.format(&filtered.records, category, kind);
        for (index, payload) in payloads.iter().enumerate() {
            match self.dispatcher.send(payload).await {
                Ok(status) => {
                    pair.delivered += 1;
                    tracing::info!(
                        "Delivered {} {} alert {}/{} ({} record(s), status {})",
                        category,
                        kind,
                        index + 1,
                        payloads.len(),
                        payload.record_count(),
                        status
                    );
                }
                Err(e) => {
                    pair.failed += 1;
                    tracing::warn!(
                        "Delivering {} {} alert {}/{} failed: {}",
                        category,
                        kind,
                        index + 1,
                        payloads.len(),
                        e
                    );
                }
            }
        }

        Ok(pair)
    }

    fn settings(&self, category: NodeCategory) -> crate::Result<&CategorySettings> {
        self.categories.get(&category).ok_or_else(|| {
            crate::NodewatchError::Config(format!("no settings for {} nodes", category))
        })
    }
}
