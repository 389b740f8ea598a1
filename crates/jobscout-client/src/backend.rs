use jobscout_core::config::{ScraperConfig, SessionBackend};
use jobscout_core::error::AppError;
use jobscout_core::traits::{Session, SessionProvider};

use crate::browser_session::{ChromiumSession, ChromiumSessionProvider, LaunchProfile};
use crate::http_session::{HttpSession, HttpSessionProvider};

/// The session backend picked at start-up from [`ScraperConfig`].
#[derive(Clone)]
pub enum BackendProvider {
    Chromium(ChromiumSessionProvider),
    Http(HttpSessionProvider),
}

impl BackendProvider {
    /// Build the provider named by `config.backend`.
    ///
    /// Chromium is not launched here; a missing binary surfaces on the
    /// first `open`.
    pub fn from_config(config: &ScraperConfig) -> Result<Self, AppError> {
        match config.backend {
            SessionBackend::Browser => {
                let mut provider =
                    ChromiumSessionProvider::new(LaunchProfile::from(config.environment));
                if let Some(bin) = &config.chrome_bin {
                    provider = provider.with_chrome_bin(bin);
                }
                tracing::info!(profile = ?provider.profile(), "Using Chromium sessions");
                Ok(Self::Chromium(provider))
            }
            SessionBackend::Http => {
                tracing::info!("Using plain HTTP sessions");
                Ok(Self::Http(HttpSessionProvider::with_timeout(
                    config.source_timeout,
                )?))
            }
        }
    }
}

pub enum BackendSession {
    Chromium(ChromiumSession),
    Http(HttpSession),
}

impl SessionProvider for BackendProvider {
    type Session = BackendSession;

    async fn open(&self) -> Result<BackendSession, AppError> {
        match self {
            Self::Chromium(p) => p.open().await.map(BackendSession::Chromium),
            Self::Http(p) => p.open().await.map(BackendSession::Http),
        }
    }
}

impl Session for BackendSession {
    async fn navigate(&mut self, url: &str) -> Result<(), AppError> {
        match self {
            Self::Chromium(s) => s.navigate(url).await,
            Self::Http(s) => s.navigate(url).await,
        }
    }

    async fn scroll_by(&mut self, pixels: u32) -> Result<(), AppError> {
        match self {
            Self::Chromium(s) => s.scroll_by(pixels).await,
            Self::Http(s) => s.scroll_by(pixels).await,
        }
    }

    async fn content(&mut self) -> Result<String, AppError> {
        match self {
            Self::Chromium(s) => s.content().await,
            Self::Http(s) => s.content().await,
        }
    }

    async fn close(self) {
        match self {
            Self::Chromium(s) => s.close().await,
            Self::Http(s) => s.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobscout_core::config::ExecutionEnvironment;

    #[test]
    fn picks_backend_from_config() {
        let config = ScraperConfig {
            backend: SessionBackend::Http,
            ..ScraperConfig::default()
        };
        assert!(matches!(
            BackendProvider::from_config(&config).unwrap(),
            BackendProvider::Http(_)
        ));

        let config = ScraperConfig {
            environment: ExecutionEnvironment::Container,
            ..ScraperConfig::default()
        };
        match BackendProvider::from_config(&config).unwrap() {
            BackendProvider::Chromium(p) => assert_eq!(p.profile(), LaunchProfile::Container),
            BackendProvider::Http(_) => panic!("expected chromium"),
        }
    }
}
