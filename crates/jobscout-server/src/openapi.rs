use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobscout API",
        version = "0.1.0",
        description = "Searches several job boards with headless browsers and merges the listings."
    ),
    paths(crate::routes::scrape_jobs, crate::routes::health),
    components(schemas(
        crate::dto::JobResponse,
        crate::dto::QueryEchoResponse,
        crate::dto::ScrapeJobsResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "jobs", description = "Job listing search"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
