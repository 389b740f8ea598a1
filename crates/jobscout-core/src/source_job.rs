use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::extract::RecordExtractor;
use crate::limiter::SessionLimiter;
use crate::models::{JobRecord, ScrapeQuery};
use crate::source::SourceRule;
use crate::traits::{Session, SessionProvider};

/// One source's share of a scrape request, ready to run.
///
/// Holds everything it needs, so [`run`](SourceJob::run) takes no
/// arguments and can be moved onto its own task.
pub struct SourceJob<P: SessionProvider> {
    provider: P,
    limiter: SessionLimiter,
    rule: Arc<SourceRule>,
    query: Arc<ScrapeQuery>,
    extractor: RecordExtractor,
    timeout: Duration,
}

impl<P: SessionProvider> SourceJob<P> {
    pub fn new(
        provider: P,
        limiter: SessionLimiter,
        rule: Arc<SourceRule>,
        query: Arc<ScrapeQuery>,
        extractor: RecordExtractor,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            limiter,
            rule,
            query,
            extractor,
            timeout,
        }
    }

    pub fn source(&self) -> &str {
        &self.rule.id
    }

    /// Take a limiter slot, open a session, extract, close the session.
    ///
    /// Extraction failures and timeouts come back as non-fatal errors; the
    /// orchestrator reports them and the source contributes no records.
    /// [`AppError::is_fatal`] errors mean no session could be obtained.
    pub async fn run(self) -> Result<Vec<JobRecord>, AppError> {
        let _permit = self.limiter.acquire().await?;
        tracing::debug!(source = %self.rule.id, "Acquired session slot");

        let mut session = self.provider.open().await?;

        let extracted = tokio::time::timeout(
            self.timeout,
            self.extractor
                .try_extract(&mut session, &self.rule, &self.query),
        )
        .await;

        session.close().await;

        extracted.unwrap_or(Err(AppError::Timeout(self.timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LoadPolicy;
    use crate::models::QueryInput;
    use crate::source::{self, SourceRegistry};
    use crate::testutil::{StubSessionProvider, indeed_page};

    fn query() -> Arc<ScrapeQuery> {
        let q = ScrapeQuery::validate(
            QueryInput {
                title: Some("AI Developer".into()),
                location: Some("Bangalore".into()),
                ..Default::default()
            },
            &SourceRegistry::builtin(),
            10,
        )
        .unwrap();
        Arc::new(q)
    }

    fn job(provider: &StubSessionProvider, limiter: &SessionLimiter, timeout: Duration) -> SourceJob<StubSessionProvider> {
        SourceJob::new(
            provider.clone(),
            limiter.clone(),
            Arc::new(source::indeed()),
            query(),
            RecordExtractor::new(LoadPolicy::immediate()),
            timeout,
        )
    }

    #[tokio::test]
    async fn run_closes_session_and_releases_slot() {
        let provider = StubSessionProvider::new().with_page("indeed.com", indeed_page(4));
        let limiter = SessionLimiter::new(1);

        let records = job(&provider, &limiter, Duration::from_secs(5)).run().await.unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].url(), "https://www.indeed.com/viewjob?jk=1");
        assert_eq!(provider.opened(), 1);
        assert_eq!(provider.closed(), 1);
        assert_eq!(provider.active(), 0);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn navigation_failure_is_reported_and_closes_session() {
        let provider = StubSessionProvider::new().failing_navigation("indeed.com");
        let limiter = SessionLimiter::new(1);

        let err = job(&provider, &limiter, Duration::from_secs(5)).run().await.unwrap_err();

        assert!(matches!(err, AppError::NavigationError(_)));
        assert!(!err.is_fatal());
        assert_eq!(provider.closed(), 1);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn timeout_is_reported_and_closes_session() {
        let provider = StubSessionProvider::new().hanging_navigation("indeed.com");
        let limiter = SessionLimiter::new(1);

        let err = job(&provider, &limiter, Duration::from_millis(50)).run().await.unwrap_err();

        assert!(matches!(err, AppError::Timeout(d) if d == Duration::from_millis(50)));
        assert_eq!(err.to_string(), "Timed out after 50ms");
        assert!(!err.is_fatal());
        assert_eq!(provider.closed(), 1);
        assert_eq!(provider.active(), 0);
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn open_failure_is_an_error() {
        let provider = StubSessionProvider::new().failing_open("chromium not found");
        let limiter = SessionLimiter::new(1);

        let err = job(&provider, &limiter, Duration::from_secs(5)).run().await.unwrap_err();

        assert!(matches!(err, AppError::SessionUnavailable(_)));
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn closed_limiter_opens_no_session() {
        let provider = StubSessionProvider::new();
        let limiter = SessionLimiter::new(1);
        limiter.close();

        let err = job(&provider, &limiter, Duration::from_secs(5)).run().await.unwrap_err();

        assert!(matches!(err, AppError::LimiterClosed));
        assert_eq!(provider.open_calls(), 0);
    }
}
