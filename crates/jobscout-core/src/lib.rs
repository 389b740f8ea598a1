pub mod config;
pub mod error;
pub mod extract;
pub mod limiter;
pub mod models;
pub mod orchestrator;
pub mod source;
pub mod source_job;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::{ExecutionEnvironment, ScraperConfig, SessionBackend};
pub use error::AppError;
pub use extract::{LoadPolicy, RecordExtractor};
pub use limiter::SessionLimiter;
pub use models::{JobRecord, Platform, QueryInput, ScrapeQuery, ScrapeResult};
pub use orchestrator::{OrchestratorConfig, ScrapeOrchestrator, TracingScrapeReporter};
pub use source::SourceRegistry;
pub use traits::{Session, SessionProvider};
