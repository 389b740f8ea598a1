use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::source::SourceRegistry;

/// Lowest accepted per-source result limit.
pub const MIN_MAX_RESULTS: usize = 1;
/// Highest accepted per-source result limit.
pub const MAX_MAX_RESULTS: usize = 25;
/// Per-source result limit when the caller does not pass one.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// A named attribute of a job listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobField {
    Title,
    Company,
    Location,
    Url,
    Posted,
    Salary,
    Experience,
}

impl JobField {
    pub const ALL: [JobField; 7] = [
        JobField::Title,
        JobField::Company,
        JobField::Location,
        JobField::Url,
        JobField::Posted,
        JobField::Salary,
        JobField::Experience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobField::Title => "title",
            JobField::Company => "company",
            JobField::Location => "location",
            JobField::Url => "url",
            JobField::Posted => "posted",
            JobField::Salary => "salary",
            JobField::Experience => "experience",
        }
    }
}

impl fmt::Display for JobField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One job listing extracted from a source.
///
/// Every string is always present; missing data is the empty string.
/// A record can only be built with a non-empty title, see
/// [`JobRecordBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    title: String,
    company: String,
    location: String,
    url: String,
    source: String,
    posted: String,
    salary: String,
    experience: String,
}

impl JobRecord {
    pub fn builder(source: impl Into<String>) -> JobRecordBuilder {
        JobRecordBuilder {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn posted(&self) -> &str {
        &self.posted
    }

    pub fn salary(&self) -> &str {
        &self.salary
    }

    pub fn experience(&self) -> &str {
        &self.experience
    }

    pub fn get(&self, field: JobField) -> &str {
        match field {
            JobField::Title => &self.title,
            JobField::Company => &self.company,
            JobField::Location => &self.location,
            JobField::Url => &self.url,
            JobField::Posted => &self.posted,
            JobField::Salary => &self.salary,
            JobField::Experience => &self.experience,
        }
    }
}

/// Candidate record assembled field by field from a card.
#[derive(Debug, Clone, Default)]
pub struct JobRecordBuilder {
    title: String,
    company: String,
    location: String,
    url: String,
    source: String,
    posted: String,
    salary: String,
    experience: String,
}

impl JobRecordBuilder {
    pub fn set(&mut self, field: JobField, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match field {
            JobField::Title => self.title = value,
            JobField::Company => self.company = value,
            JobField::Location => self.location = value,
            JobField::Url => self.url = value,
            JobField::Posted => self.posted = value,
            JobField::Salary => self.salary = value,
            JobField::Experience => self.experience = value,
        }
        self
    }

    pub fn with(mut self, field: JobField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Finish the record, or `None` when the title is empty.
    pub fn build(self) -> Option<JobRecord> {
        if self.title.trim().is_empty() {
            return None;
        }
        Some(JobRecord {
            title: self.title,
            company: self.company,
            location: self.location,
            url: self.url,
            source: self.source,
            posted: self.posted,
            salary: self.salary,
            experience: self.experience,
        })
    }
}

/// Which sources a query runs against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Every configured source.
    All,
    /// A single source, by identifier.
    Source(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Platform::All => "all",
            Platform::Source(id) => id,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Err("platform must not be empty".to_string()),
            "all" => Ok(Platform::All),
            id => Ok(Platform::Source(id.to_string())),
        }
    }
}

impl Serialize for Platform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Raw, unvalidated query parameters as they arrive from HTTP or the CLI.
#[derive(Debug, Clone, Default)]
pub struct QueryInput {
    pub title: Option<String>,
    pub location: Option<String>,
    pub platform: Option<String>,
    pub max_results: Option<String>,
}

/// A validated scrape request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeQuery {
    title: String,
    location: String,
    platform: Platform,
    max_results: usize,
}

impl ScrapeQuery {
    /// Validate raw input against the configured sources.
    ///
    /// - `title` and `location` must be present and non-blank
    /// - `platform` defaults to `all` and must name a configured source
    /// - `max_results` defaults to `default_max_results` and must be
    ///   within `1..=25`
    pub fn validate(
        input: QueryInput,
        registry: &SourceRegistry,
        default_max_results: usize,
    ) -> Result<Self, AppError> {
        let title = required("title", input.title)?;
        let location = required("location", input.location)?;

        let platform = match input.platform {
            None => Platform::All,
            Some(raw) => raw
                .parse::<Platform>()
                .map_err(AppError::InvalidQuery)?,
        };
        if let Platform::Source(id) = &platform
            && registry.get(id).is_none()
        {
            return Err(AppError::InvalidQuery(format!(
                "unknown platform '{id}', expected one of: all, {}",
                registry.ids().join(", ")
            )));
        }

        let max_results = match input.max_results {
            None => default_max_results,
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                AppError::InvalidQuery(format!(
                    "max_results '{raw}' must be an integer between {MIN_MAX_RESULTS} and {MAX_MAX_RESULTS}"
                ))
            })?,
        };
        if !(MIN_MAX_RESULTS..=MAX_MAX_RESULTS).contains(&max_results) {
            return Err(AppError::InvalidQuery(format!(
                "max_results must be between {MIN_MAX_RESULTS} and {MAX_MAX_RESULTS}, got {max_results}"
            )));
        }

        Ok(Self {
            title,
            location,
            platform,
            max_results,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidQuery(format!("{name} is required"))),
    }
}

/// Echo of the query inside a [`ScrapeResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryEcho {
    pub title: String,
    pub location: String,
    pub platform: Platform,
}

/// The aggregated response for one scrape request.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub query: QueryEcho,
    pub total_found: usize,
    pub jobs: Vec<JobRecord>,
}

impl ScrapeResult {
    /// Wrap merged records with the query echo and their count.
    pub fn aggregate(query: &ScrapeQuery, jobs: Vec<JobRecord>) -> Self {
        Self {
            query: QueryEcho {
                title: query.title.clone(),
                location: query.location.clone(),
                platform: query.platform.clone(),
            },
            total_found: jobs.len(),
            jobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: Option<&str>, location: Option<&str>) -> QueryInput {
        QueryInput {
            title: title.map(String::from),
            location: location.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn builder_rejects_empty_title() {
        assert!(JobRecord::builder("linkedin").build().is_none());
        assert!(
            JobRecord::builder("linkedin")
                .with(JobField::Title, "   ")
                .build()
                .is_none()
        );
    }

    #[test]
    fn builder_defaults_missing_fields_to_empty() {
        let record = JobRecord::builder("naukri")
            .with(JobField::Title, "Rust Engineer")
            .with(JobField::Salary, "10-15 Lacs")
            .build()
            .unwrap();

        assert_eq!(record.title(), "Rust Engineer");
        assert_eq!(record.source(), "naukri");
        assert_eq!(record.salary(), "10-15 Lacs");
        assert_eq!(record.company(), "");
        assert_eq!(record.get(JobField::Posted), "");
    }

    #[test]
    fn record_serializes_all_eight_keys() {
        let record = JobRecord::builder("indeed")
            .with(JobField::Title, "AI Developer")
            .build()
            .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 8);
        for key in [
            "title",
            "company",
            "location",
            "url",
            "source",
            "posted",
            "salary",
            "experience",
        ] {
            assert!(obj[key].is_string(), "missing string key {key}");
        }
    }

    #[test]
    fn platform_parsing() {
        assert_eq!("all".parse::<Platform>().unwrap(), Platform::All);
        assert_eq!("ALL".parse::<Platform>().unwrap(), Platform::All);
        assert_eq!(
            " LinkedIn ".parse::<Platform>().unwrap(),
            Platform::Source("linkedin".into())
        );
        assert!("".parse::<Platform>().is_err());
    }

    #[test]
    fn validate_applies_defaults() {
        let registry = SourceRegistry::builtin();
        let q = ScrapeQuery::validate(
            input(Some(" AI Developer "), Some("Bangalore")),
            &registry,
            DEFAULT_MAX_RESULTS,
        )
        .unwrap();

        assert_eq!(q.title(), "AI Developer");
        assert_eq!(q.platform(), &Platform::All);
        assert_eq!(q.max_results(), 10);
    }

    #[test]
    fn validate_requires_title_and_location() {
        let registry = SourceRegistry::builtin();
        let err = ScrapeQuery::validate(input(Some("AI"), None), &registry, 10).unwrap_err();
        assert!(err.to_string().contains("location is required"));

        let err = ScrapeQuery::validate(input(Some("  "), Some("Pune")), &registry, 10).unwrap_err();
        assert!(err.to_string().contains("title is required"));
    }

    #[test]
    fn validate_bounds_max_results() {
        let registry = SourceRegistry::builtin();
        for bad in ["0", "26", "-3", "ten"] {
            let mut i = input(Some("AI"), Some("Pune"));
            i.max_results = Some(bad.into());
            let err = ScrapeQuery::validate(i, &registry, 10).unwrap_err();
            assert!(err.is_validation(), "{bad} should be rejected");
        }

        let mut i = input(Some("AI"), Some("Pune"));
        i.max_results = Some("25".into());
        assert_eq!(
            ScrapeQuery::validate(i, &registry, 10).unwrap().max_results(),
            25
        );
    }

    #[test]
    fn validate_rejects_unknown_platform() {
        let registry = SourceRegistry::builtin();
        let mut i = input(Some("AI"), Some("Pune"));
        i.platform = Some("monster".into());
        let err = ScrapeQuery::validate(i, &registry, 10).unwrap_err();
        assert!(err.to_string().contains("unknown platform 'monster'"));
    }

    #[test]
    fn aggregate_counts_jobs() {
        let registry = SourceRegistry::builtin();
        let q = ScrapeQuery::validate(input(Some("AI"), Some("Pune")), &registry, 10).unwrap();
        let jobs = vec![
            JobRecord::builder("linkedin")
                .with(JobField::Title, "A")
                .build()
                .unwrap(),
            JobRecord::builder("naukri")
                .with(JobField::Title, "B")
                .build()
                .unwrap(),
        ];

        let result = ScrapeResult::aggregate(&q, jobs);
        assert_eq!(result.total_found, 2);
        assert_eq!(result.total_found, result.jobs.len());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["query"]["platform"], "all");
        assert_eq!(json["query"]["title"], "AI");
    }
}
