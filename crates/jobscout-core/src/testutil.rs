//! Test utilities: a stub session backend and canned result pages.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! Shared state uses atomics and `Arc<Mutex<_>>`, allowing test
//! assertions on how many sessions were opened and what they did.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::orchestrator::{ScrapeEvent, ScrapeReporter};
use crate::traits::{Session, SessionProvider};

// ---------------------------------------------------------------------------
// StubSessionProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct StubConfig {
    /// (url fragment, html) pairs. First match wins.
    pages: Vec<(String, String)>,
    failing: Vec<String>,
    hanging: Vec<String>,
    panicking: Vec<String>,
    open_error: Option<String>,
    latency: Duration,
}

#[derive(Debug, Default)]
struct StubCounters {
    open_calls: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    scrolls: AtomicUsize,
    visited: Mutex<Vec<String>>,
}

/// Session provider that serves canned HTML keyed by URL fragment.
///
/// Clones share counters, so a clone handed to an orchestrator can be
/// inspected through the original afterwards.
#[derive(Debug, Clone, Default)]
pub struct StubSessionProvider {
    config: Arc<StubConfig>,
    counters: Arc<StubCounters>,
}

impl StubSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for any URL containing `fragment`.
    pub fn with_page(mut self, fragment: &str, html: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .pages
            .push((fragment.to_string(), html.into()));
        self
    }

    /// Navigation to URLs containing `fragment` returns an error.
    pub fn failing_navigation(mut self, fragment: &str) -> Self {
        Arc::make_mut(&mut self.config)
            .failing
            .push(fragment.to_string());
        self
    }

    /// Navigation to URLs containing `fragment` never completes.
    pub fn hanging_navigation(mut self, fragment: &str) -> Self {
        Arc::make_mut(&mut self.config)
            .hanging
            .push(fragment.to_string());
        self
    }

    /// Navigation to URLs containing `fragment` panics.
    pub fn panicking_navigation(mut self, fragment: &str) -> Self {
        Arc::make_mut(&mut self.config)
            .panicking
            .push(fragment.to_string());
        self
    }

    /// Every `open` fails with [`AppError::SessionUnavailable`].
    pub fn failing_open(mut self, message: &str) -> Self {
        Arc::make_mut(&mut self.config).open_error = Some(message.to_string());
        self
    }

    /// Each navigation sleeps this long before resolving.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).latency = latency;
        self
    }

    pub fn open_calls(&self) -> usize {
        self.counters.open_calls.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Sessions currently open.
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// Highest number of sessions open at the same time.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.counters.scrolls.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.counters.visited.lock().unwrap().clone()
    }
}

impl SessionProvider for StubSessionProvider {
    type Session = StubSession;

    async fn open(&self) -> Result<StubSession, AppError> {
        self.counters.open_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.config.open_error {
            return Err(AppError::SessionUnavailable(message.clone()));
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);

        Ok(StubSession {
            config: Arc::clone(&self.config),
            counters: Arc::clone(&self.counters),
            page: None,
            _guard: ActiveGuard(Arc::clone(&self.counters)),
        })
    }
}

/// Marks the session closed however it goes away, including when the
/// owning task is cancelled or panics.
#[derive(Debug)]
struct ActiveGuard(Arc<StubCounters>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
        self.0.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct StubSession {
    config: Arc<StubConfig>,
    counters: Arc<StubCounters>,
    page: Option<String>,
    _guard: ActiveGuard,
}

fn url_matches(fragments: &[String], url: &str) -> bool {
    fragments.iter().any(|f| url.contains(f.as_str()))
}

impl Session for StubSession {
    async fn navigate(&mut self, url: &str) -> Result<(), AppError> {
        self.counters.visited.lock().unwrap().push(url.to_string());

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        if url_matches(&self.config.panicking, url) {
            panic!("stub navigation panicked for {url}");
        }
        if url_matches(&self.config.hanging, url) {
            std::future::pending::<()>().await;
        }
        if url_matches(&self.config.failing, url) {
            return Err(AppError::NavigationError(format!(
                "net::ERR_CONNECTION_REFUSED at {url}"
            )));
        }

        let html = self
            .config
            .pages
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, html)| html.clone())
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        self.page = Some(html);
        Ok(())
    }

    async fn scroll_by(&mut self, _pixels: u32) -> Result<(), AppError> {
        self.counters.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn content(&mut self) -> Result<String, AppError> {
        self.page
            .clone()
            .ok_or_else(|| AppError::NavigationError("no page loaded".into()))
    }

    async fn close(self) {}
}

// ---------------------------------------------------------------------------
// Canned result pages
// ---------------------------------------------------------------------------

fn wrap(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>Jobs</title></head><body>{body}</body></html>")
}

/// LinkedIn guest search page with `n` cards titled `LinkedIn Job {i}`.
pub fn linkedin_page(n: usize) -> String {
    let mut body = String::from("<ul class=\"jobs-search__results-list\">");
    for i in 1..=n {
        let _ = write!(
            body,
            r#"<li><div class="base-card">
                <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/{i}?refId=ref{i}&amp;trackingId=t{i}"></a>
                <h3 class="base-search-card__title">
                    LinkedIn Job {i}
                </h3>
                <h4 class="base-search-card__subtitle">Company {i}</h4>
                <span class="job-search-card__location">Bengaluru, Karnataka, India</span>
                <time class="job-search-card__listdate" datetime="2026-10-01">2 weeks ago</time>
            </div></li>"#
        );
    }
    body.push_str("</ul>");
    wrap(&body)
}

/// Naukri search page with `n` cards titled `Naukri Job {i}`.
pub fn naukri_page(n: usize) -> String {
    let mut body = String::from("<div class=\"styles_jlc__main\">");
    for i in 1..=n {
        let _ = write!(
            body,
            r#"<div class="srp-jobtuple-wrapper">
                <a class="title" href="https://www.naukri.com/job-listings-naukri-job-{i}">Naukri Job {i}</a>
                <a class="comp-name">Naukri Co {i}</a>
                <span class="locWdth">Bengaluru</span>
                <span class="exp-wrap"><span class="expwdth">2-5 Yrs</span></span>
                <span class="sal-wrap"><span class="salwdth">10-20 Lacs PA</span></span>
            </div>"#
        );
    }
    body.push_str("</div>");
    wrap(&body)
}

/// Indeed search page with `n` cards titled `Indeed Job {i}` and relative
/// `/viewjob?jk={i}` links.
pub fn indeed_page(n: usize) -> String {
    let mut body = String::from("<div id=\"mosaic-jobResults\">");
    for i in 1..=n {
        let _ = write!(
            body,
            r#"<div class="job_seen_beacon">
                <h2 class="jobTitle"><a href="/viewjob?jk={i}"><span>Indeed Job {i}</span></a></h2>
                <span data-testid="company-name">Indeed Co {i}</span>
                <div data-testid="text-location">Bengaluru, Karnataka</div>
            </div>"#
        );
    }
    body.push_str("</div>");
    wrap(&body)
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Owned copy of a [`ScrapeEvent`], minus the run id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Started { platform: String, sources: usize },
    Queued { source: String },
    Completed { source: String, found: usize },
    Failed { source: String, error: String },
    Finished { total: usize, failed_sources: usize },
}

/// Reporter that keeps every event for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ScrapeReporter for RecordingReporter {
    fn report(&self, event: ScrapeEvent<'_>) {
        let recorded = match event {
            ScrapeEvent::RunStarted {
                platform, sources, ..
            } => RecordedEvent::Started {
                platform: platform.to_string(),
                sources,
            },
            ScrapeEvent::SourceQueued { source, .. } => RecordedEvent::Queued {
                source: source.to_string(),
            },
            ScrapeEvent::SourceCompleted { source, found, .. } => RecordedEvent::Completed {
                source: source.to_string(),
                found,
            },
            ScrapeEvent::SourceFailed { source, error, .. } => RecordedEvent::Failed {
                source: source.to_string(),
                error: error.to_string(),
            },
            ScrapeEvent::RunCompleted {
                total,
                failed_sources,
                ..
            } => RecordedEvent::Finished {
                total,
                failed_sources,
            },
        };
        self.events.lock().unwrap().push(recorded);
    }
}
