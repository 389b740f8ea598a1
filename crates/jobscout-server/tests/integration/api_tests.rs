use std::collections::HashSet;

use axum::http::StatusCode;

use jobscout_core::testutil::StubSessionProvider;

use crate::integration::common::{get, json_body, setup_test_app, stub_pages};

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app(StubSessionProvider::new());

    let response = get(app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json, serde_json::json!({"status": "ok"}));
    assert_eq!(app.provider.open_calls(), 0);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app(StubSessionProvider::new());

    let response = get(app.router, "/api-docs/openapi.json").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/scrape-jobs"].is_object());
    assert!(json["paths"]["/health"].is_object());
}

#[tokio::test]
async fn scrape_single_platform() {
    let app = setup_test_app(stub_pages());

    let response = get(
        app.router,
        "/scrape-jobs?title=AI%20Developer&location=Bangalore&platform=linkedin&max_results=5",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["query"]["title"], "AI Developer");
    assert_eq!(json["query"]["location"], "Bangalore");
    assert_eq!(json["query"]["platform"], "linkedin");
    assert_eq!(json["total_found"], 5);

    let jobs = json["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 5);
    assert_eq!(jobs[0]["title"], "LinkedIn Job 1");
    assert_eq!(jobs[0]["company"], "Company 1");
    assert_eq!(jobs[0]["url"], "https://www.linkedin.com/jobs/view/1");
    assert_eq!(jobs[0]["source"], "linkedin");
    assert_eq!(jobs[0]["posted"], "2026-10-01");
    assert_eq!(jobs[0]["salary"], "");
    assert_eq!(app.provider.opened(), 1);
}

#[tokio::test]
async fn scrape_all_merges_every_source() {
    let app = setup_test_app(stub_pages());

    let response = get(
        app.router,
        "/scrape-jobs?title=AI+Developer&location=Bangalore&max_results=5",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["query"]["platform"], "all");

    let jobs = json["jobs"].as_array().unwrap();
    assert_eq!(json["total_found"].as_u64().unwrap() as usize, jobs.len());
    assert_eq!(jobs.len(), 5 + 3 + 5);

    let sources: HashSet<_> = jobs.iter().map(|j| j["source"].as_str().unwrap()).collect();
    assert_eq!(sources, HashSet::from(["linkedin", "naukri", "indeed"]));
    assert!(jobs.iter().all(|j| !j["title"].as_str().unwrap().is_empty()));
    assert_eq!(app.provider.opened(), 3);
    assert_eq!(app.provider.active(), 0);
}

#[tokio::test]
async fn default_max_results_applies() {
    let app = setup_test_app(stub_pages());

    let response = get(
        app.router,
        "/scrape-jobs?title=dev&location=pune&platform=indeed",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total_found"], 6);
    assert_eq!(json["jobs"][0]["url"], "https://www.indeed.com/viewjob?jk=1");
}

#[tokio::test]
async fn missing_location_is_rejected_without_sessions() {
    let app = setup_test_app(stub_pages());

    let response = get(app.router, "/scrape-jobs?title=AI+Developer").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "validation_error");
    assert!(json["message"].as_str().unwrap().contains("location"));
    assert_eq!(app.provider.open_calls(), 0);
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let app = setup_test_app(stub_pages());

    let response = get(app.router, "/scrape-jobs?title=%20%20&location=Pune").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.open_calls(), 0);
}

#[tokio::test]
async fn unknown_platform_is_rejected() {
    let app = setup_test_app(stub_pages());

    let response = get(
        app.router,
        "/scrape-jobs?title=dev&location=pune&platform=monster",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "validation_error");
    assert!(json["message"].as_str().unwrap().contains("monster"));
    assert_eq!(app.provider.open_calls(), 0);
}

#[tokio::test]
async fn max_results_out_of_range_is_rejected() {
    for bad in ["0", "26", "ten", "-1"] {
        let app = setup_test_app(stub_pages());

        let response = get(
            app.router,
            &format!("/scrape-jobs?title=dev&location=pune&max_results={bad}"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "max_results={bad}");
        assert_eq!(app.provider.open_calls(), 0);
    }
}

#[tokio::test]
async fn failing_source_leaves_others_intact() {
    let app = setup_test_app(stub_pages().failing_navigation("naukri.com"));

    let response = get(
        app.router,
        "/scrape-jobs?title=dev&location=pune&max_results=2",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["total_found"], 4);
    let jobs = json["jobs"].as_array().unwrap();
    assert!(jobs.iter().all(|j| j["source"] != "naukri"));
}

#[tokio::test]
async fn no_browser_returns_503() {
    let app = setup_test_app(StubSessionProvider::new().failing_open("chromium not found"));

    let response = get(
        app.router,
        "/scrape-jobs?title=dev&location=pune",
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json["error"], "browser_unavailable");
}
