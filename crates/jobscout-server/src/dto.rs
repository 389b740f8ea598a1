use serde::{Deserialize, Serialize};

use jobscout_core::models::{JobRecord, QueryInput, ScrapeResult};

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

/// Query string of `GET /scrape-jobs`.
///
/// Everything arrives as text so that a malformed `max_results` goes
/// through the same validation path, and the same error body, as any other
/// bad input.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScrapeJobsParams {
    /// Job title to search for.
    #[param(example = "AI Developer")]
    pub title: Option<String>,
    /// Location to search in.
    #[param(example = "Bangalore")]
    pub location: Option<String>,
    /// A source id or `all`.
    #[param(example = "all")]
    pub platform: Option<String>,
    /// Per-source result cap, 1 to 25.
    #[param(example = "10")]
    pub max_results: Option<String>,
}

impl From<ScrapeJobsParams> for QueryInput {
    fn from(params: ScrapeJobsParams) -> Self {
        Self {
            title: params.title,
            location: params.location,
            platform: params.platform,
            max_results: params.max_results,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobResponse {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
    pub posted: String,
    pub salary: String,
    pub experience: String,
}

impl From<&JobRecord> for JobResponse {
    fn from(job: &JobRecord) -> Self {
        Self {
            title: job.title().to_string(),
            company: job.company().to_string(),
            location: job.location().to_string(),
            url: job.url().to_string(),
            source: job.source().to_string(),
            posted: job.posted().to_string(),
            salary: job.salary().to_string(),
            experience: job.experience().to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QueryEchoResponse {
    pub title: String,
    pub location: String,
    pub platform: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScrapeJobsResponse {
    pub query: QueryEchoResponse,
    pub total_found: usize,
    pub jobs: Vec<JobResponse>,
}

impl From<ScrapeResult> for ScrapeJobsResponse {
    fn from(result: ScrapeResult) -> Self {
        Self {
            query: QueryEchoResponse {
                title: result.query.title,
                location: result.query.location,
                platform: result.query.platform.to_string(),
            },
            total_found: result.total_found,
            jobs: result.jobs.iter().map(JobResponse::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
