use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::extract::LoadPolicy;
use crate::models::{DEFAULT_MAX_RESULTS, MAX_MAX_RESULTS, MIN_MAX_RESULTS};
use crate::orchestrator::OrchestratorConfig;
use crate::source::SourceRegistry;

/// Which session backend opens pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionBackend {
    /// Headless chromium, renders JavaScript.
    #[default]
    Browser,
    /// Plain HTTP fetch. Scrolling does nothing.
    Http,
}

impl FromStr for SessionBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" | "chromium" => Ok(Self::Browser),
            "http" => Ok(Self::Http),
            other => Err(AppError::ConfigError(format!(
                "Invalid JOBSCOUT_SESSION_BACKEND '{other}': expected 'browser' or 'http'"
            ))),
        }
    }
}

/// Where the process runs. Decides the browser launch flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEnvironment {
    Container,
    Local,
}

/// Process-wide scraper settings.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub max_browsers: usize,
    pub default_max_results: usize,
    pub source_timeout: Duration,
    pub load_policy: LoadPolicy,
    pub backend: SessionBackend,
    pub sources_file: Option<PathBuf>,
    pub environment: ExecutionEnvironment,
    pub chrome_bin: Option<String>,
    pub server_port: u16,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_browsers: 2,
            default_max_results: DEFAULT_MAX_RESULTS,
            source_timeout: Duration::from_secs(60),
            load_policy: LoadPolicy::default(),
            backend: SessionBackend::Browser,
            sources_file: None,
            environment: ExecutionEnvironment::Local,
            chrome_bin: None,
            server_port: 8000,
        }
    }
}

impl ScraperConfig {
    /// Read configuration from environment variables.
    ///
    /// - `MAX_BROWSERS` (optional, defaults to 2)
    /// - `JOBSCOUT_DEFAULT_MAX_RESULTS` (optional, defaults to 10)
    /// - `JOBSCOUT_SOURCE_TIMEOUT_SECS` (optional, defaults to 60)
    /// - `JOBSCOUT_SETTLE_MS`, `JOBSCOUT_SCROLL_STEPS`, `JOBSCOUT_SCROLL_PAUSE_MS`
    /// - `JOBSCOUT_SESSION_BACKEND` (`browser` or `http`)
    /// - `JOBSCOUT_SOURCES_FILE` (optional JSON source rules)
    /// - `DOCKER` or `/.dockerenv` (container launch profile)
    /// - `CHROME_BIN` (optional browser binary)
    /// - `JOBSCOUT_SERVER_PORT` (optional, defaults to 8000)
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        if Path::new("/.dockerenv").exists() {
            config.environment = ExecutionEnvironment::Container;
        }
        Ok(config)
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup` and without probing the filesystem.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_browsers = parse_or(get("MAX_BROWSERS"), "MAX_BROWSERS", defaults.max_browsers)?;
        if max_browsers == 0 {
            return Err(AppError::ConfigError(
                "MAX_BROWSERS must be at least 1".into(),
            ));
        }

        let default_max_results = parse_or(
            get("JOBSCOUT_DEFAULT_MAX_RESULTS"),
            "JOBSCOUT_DEFAULT_MAX_RESULTS",
            defaults.default_max_results,
        )?;
        if !(MIN_MAX_RESULTS..=MAX_MAX_RESULTS).contains(&default_max_results) {
            return Err(AppError::ConfigError(format!(
                "JOBSCOUT_DEFAULT_MAX_RESULTS must be between {MIN_MAX_RESULTS} and {MAX_MAX_RESULTS}"
            )));
        }

        let timeout_secs: u64 = parse_or(
            get("JOBSCOUT_SOURCE_TIMEOUT_SECS"),
            "JOBSCOUT_SOURCE_TIMEOUT_SECS",
            defaults.source_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "JOBSCOUT_SOURCE_TIMEOUT_SECS must be at least 1".into(),
            ));
        }

        let base = defaults.load_policy;
        let load_policy = LoadPolicy {
            settle_delay: Duration::from_millis(parse_or(
                get("JOBSCOUT_SETTLE_MS"),
                "JOBSCOUT_SETTLE_MS",
                base.settle_delay.as_millis() as u64,
            )?),
            scroll_steps: parse_or(
                get("JOBSCOUT_SCROLL_STEPS"),
                "JOBSCOUT_SCROLL_STEPS",
                base.scroll_steps,
            )?,
            scroll_pause: Duration::from_millis(parse_or(
                get("JOBSCOUT_SCROLL_PAUSE_MS"),
                "JOBSCOUT_SCROLL_PAUSE_MS",
                base.scroll_pause.as_millis() as u64,
            )?),
        };

        let backend = match get("JOBSCOUT_SESSION_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };

        let environment = if get("DOCKER").is_some() {
            ExecutionEnvironment::Container
        } else {
            ExecutionEnvironment::Local
        };

        let server_port = parse_or(
            get("JOBSCOUT_SERVER_PORT"),
            "JOBSCOUT_SERVER_PORT",
            defaults.server_port,
        )?;

        Ok(Self {
            max_browsers,
            default_max_results,
            source_timeout: Duration::from_secs(timeout_secs),
            load_policy,
            backend,
            sources_file: get("JOBSCOUT_SOURCES_FILE").map(PathBuf::from),
            environment,
            chrome_bin: get("CHROME_BIN"),
            server_port,
        })
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            load_policy: self.load_policy.clone(),
            source_timeout: self.source_timeout,
        }
    }

    /// Built-in sources, merged with `JOBSCOUT_SOURCES_FILE` when set.
    pub fn load_registry(&self) -> Result<SourceRegistry, AppError> {
        match &self.sources_file {
            Some(path) => SourceRegistry::load_file(path),
            None => Ok(SourceRegistry::builtin()),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {key} '{raw}': must be a non-negative integer"
            ))
        }),
    }
}
