use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use jobscout_core::extract::LoadPolicy;
use jobscout_core::limiter::SessionLimiter;
use jobscout_core::orchestrator::{OrchestratorConfig, ScrapeOrchestrator};
use jobscout_core::source::SourceRegistry;
use jobscout_core::testutil::{StubSessionProvider, indeed_page, linkedin_page, naukri_page};
use jobscout_server::routes;
use jobscout_server::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub provider: StubSessionProvider,
}

/// Stub provider serving every built-in source: 8 LinkedIn, 3 Naukri and
/// 6 Indeed cards.
pub fn stub_pages() -> StubSessionProvider {
    StubSessionProvider::new()
        .with_page("linkedin.com", linkedin_page(8))
        .with_page("naukri.com", naukri_page(3))
        .with_page("indeed.com", indeed_page(6))
}

/// Build the router over `provider` with the built-in sources and no load
/// delays.
pub fn setup_test_app(provider: StubSessionProvider) -> TestApp {
    let orchestrator = ScrapeOrchestrator::new(
        provider.clone(),
        Arc::new(SourceRegistry::builtin()),
        SessionLimiter::new(2),
        OrchestratorConfig {
            load_policy: LoadPolicy::immediate(),
            source_timeout: Duration::from_secs(5),
        },
    );
    let state = Arc::new(AppState {
        orchestrator,
        default_max_results: 10,
    });

    TestApp {
        router: routes::router(state),
        provider,
    }
}

pub async fn get(router: Router, uri: &str) -> Response<Body> {
    router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
