use std::sync::Arc;
use std::time::Duration;

use tokio::task::{AbortHandle, JoinSet};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{LoadPolicy, RecordExtractor};
use crate::limiter::SessionLimiter;
use crate::models::{JobRecord, ScrapeQuery, ScrapeResult};
use crate::source::SourceRegistry;
use crate::source_job::SourceJob;
use crate::traits::SessionProvider;

/// Events emitted during a scrape run for monitoring/logging.
#[derive(Debug, Clone)]
pub enum ScrapeEvent<'a> {
    RunStarted {
        run_id: Uuid,
        platform: &'a str,
        sources: usize,
    },
    SourceQueued {
        run_id: Uuid,
        source: &'a str,
    },
    SourceCompleted {
        run_id: Uuid,
        source: &'a str,
        found: usize,
    },
    SourceFailed {
        run_id: Uuid,
        source: &'a str,
        error: &'a AppError,
    },
    RunCompleted {
        run_id: Uuid,
        total: usize,
        failed_sources: usize,
    },
}

/// Trait for receiving scrape events (decoupled logging).
pub trait ScrapeReporter: Send + Sync {
    fn report(&self, event: ScrapeEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingScrapeReporter;

impl ScrapeReporter for TracingScrapeReporter {
    fn report(&self, event: ScrapeEvent<'_>) {
        match event {
            ScrapeEvent::RunStarted {
                run_id,
                platform,
                sources,
            } => {
                tracing::info!(%run_id, %platform, %sources, "Scrape started");
            }
            ScrapeEvent::SourceQueued { run_id, source } => {
                tracing::debug!(%run_id, %source, "Source queued");
            }
            ScrapeEvent::SourceCompleted {
                run_id,
                source,
                found,
            } => {
                tracing::info!(%run_id, %source, %found, "Source completed");
            }
            ScrapeEvent::SourceFailed {
                run_id,
                source,
                error,
            } => {
                tracing::warn!(%run_id, %source, %error, "Source failed");
            }
            ScrapeEvent::RunCompleted {
                run_id,
                total,
                failed_sources,
            } => {
                tracing::info!(%run_id, %total, %failed_sources, "Scrape completed");
            }
        }
    }
}

/// Aborts a spawned source job when the task awaiting it is dropped, so a
/// cancelled run releases its sessions and limiter slots right away.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Per-source execution settings shared by every job of a run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub load_policy: LoadPolicy,
    /// Upper bound on one source's navigate-scroll-extract cycle.
    pub source_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            load_policy: LoadPolicy::default(),
            source_timeout: Duration::from_secs(60),
        }
    }
}

/// Runs the selected sources of a query concurrently and merges their
/// records.
///
/// Generic over the session backend so tests can count sessions with a
/// stub provider instead of launching browsers.
pub struct ScrapeOrchestrator<P: SessionProvider> {
    provider: P,
    registry: Arc<SourceRegistry>,
    limiter: SessionLimiter,
    extractor: RecordExtractor,
    source_timeout: Duration,
}

impl<P: SessionProvider> ScrapeOrchestrator<P> {
    pub fn new(
        provider: P,
        registry: Arc<SourceRegistry>,
        limiter: SessionLimiter,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            limiter,
            extractor: RecordExtractor::new(config.load_policy),
            source_timeout: config.source_timeout,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn limiter(&self) -> &SessionLimiter {
        &self.limiter
    }

    /// Run the query and wrap the records into the response shape.
    pub async fn scrape(&self, query: &ScrapeQuery) -> Result<ScrapeResult, AppError> {
        let jobs = self.run(query).await?;
        Ok(ScrapeResult::aggregate(query, jobs))
    }

    /// Run the query, logging through `tracing`.
    pub async fn run(&self, query: &ScrapeQuery) -> Result<Vec<JobRecord>, AppError> {
        self.run_with(query, &TracingScrapeReporter).await
    }

    /// Run every source the query selects and concatenate their records in
    /// completion order.
    ///
    /// A source that fails or panics contributes nothing and is reported.
    /// The run itself fails only when every selected source failed to get
    /// a session.
    pub async fn run_with<R: ScrapeReporter>(
        &self,
        query: &ScrapeQuery,
        reporter: &R,
    ) -> Result<Vec<JobRecord>, AppError> {
        let run_id = Uuid::new_v4();
        let rules = self.registry.resolve(query.platform());
        let selected = rules.len();

        reporter.report(ScrapeEvent::RunStarted {
            run_id,
            platform: query.platform().as_str(),
            sources: selected,
        });

        if rules.is_empty() {
            reporter.report(ScrapeEvent::RunCompleted {
                run_id,
                total: 0,
                failed_sources: 0,
            });
            return Ok(Vec::new());
        }

        let query = Arc::new(query.clone());
        let mut tasks = JoinSet::new();

        for rule in rules {
            let source = rule.id.clone();
            reporter.report(ScrapeEvent::SourceQueued {
                run_id,
                source: &source,
            });

            let job = SourceJob::new(
                self.provider.clone(),
                self.limiter.clone(),
                rule,
                Arc::clone(&query),
                self.extractor.clone(),
                self.source_timeout,
            );

            // The inner task isolates a panicking job so its source name is
            // still known when the failure is reported.
            tasks.spawn(async move {
                let handle = tokio::spawn(job.run());
                let _abort = AbortOnDrop(handle.abort_handle());
                let outcome = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(AppError::Generic(format!("source task aborted: {e}"))),
                };
                (source, outcome)
            });
        }

        let mut jobs = Vec::new();
        let mut failed_sources = 0usize;
        let mut fatal = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (source, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!(%run_id, error = %e, "Source task lost");
                    failed_sources += 1;
                    continue;
                }
            };

            match outcome {
                Ok(records) => {
                    reporter.report(ScrapeEvent::SourceCompleted {
                        run_id,
                        source: &source,
                        found: records.len(),
                    });
                    jobs.extend(records);
                }
                Err(error) => {
                    reporter.report(ScrapeEvent::SourceFailed {
                        run_id,
                        source: &source,
                        error: &error,
                    });
                    failed_sources += 1;
                    if error.is_fatal() {
                        fatal.push(error);
                    }
                }
            }
        }

        if fatal.len() == selected
            && let Some(error) = fatal.pop()
        {
            return Err(error);
        }

        reporter.report(ScrapeEvent::RunCompleted {
            run_id,
            total: jobs.len(),
            failed_sources,
        });

        Ok(jobs)
    }

    /// Close the limiter. Jobs still waiting for a slot fail; running jobs
    /// finish normally.
    pub fn shutdown(&self) {
        tracing::info!("Closing session limiter");
        self.limiter.close();
    }
}
