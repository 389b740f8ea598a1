use std::time::Duration;

use jobscout_core::error::AppError;
use jobscout_core::traits::{Session, SessionProvider};
use reqwest::Client;

/// Session backend that downloads pages with reqwest.
///
/// Does not run JavaScript, so sources that render their result list
/// client-side come back empty. Scrolling does nothing. Useful for
/// server-rendered sources and for running without a Chromium install.
#[derive(Clone)]
pub struct HttpSessionProvider {
    client: Client,
    timeout: Duration,
}

impl HttpSessionProvider {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("jobscout/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::SessionUnavailable(format!("HTTP client error: {e}")))?;

        Ok(Self::from_client(client, timeout))
    }

    /// Use a preconfigured client. `timeout` should match the client's own.
    pub fn from_client(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
        }
    }
}

impl SessionProvider for HttpSessionProvider {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession, AppError> {
        Ok(HttpSession {
            client: self.client.clone(),
            timeout: self.timeout,
            body: None,
        })
    }
}

/// Holds the body of the last page fetched.
pub struct HttpSession {
    client: Client,
    timeout: Duration,
    body: Option<String>,
}

impl Session for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout)
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;
        self.body = Some(body);
        Ok(())
    }

    async fn scroll_by(&mut self, _pixels: u32) -> Result<(), AppError> {
        Ok(())
    }

    async fn content(&mut self) -> Result<String, AppError> {
        self.body
            .clone()
            .ok_or_else(|| AppError::NavigationError("No page loaded".into()))
    }

    async fn close(self) {}
}
