use std::path::PathBuf;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use jobscout_core::config::ExecutionEnvironment;
use jobscout_core::error::AppError;
use jobscout_core::traits::{Session, SessionProvider};
use tempfile::TempDir;
use tokio::task::JoinHandle;

const STEALTH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// How Chromium is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchProfile {
    /// No sandbox, no /dev/shm, no GPU. For Docker and similar.
    Container,
    /// Headless with automation markers hidden, for desktops.
    Local,
}

impl From<ExecutionEnvironment> for LaunchProfile {
    fn from(env: ExecutionEnvironment) -> Self {
        match env {
            ExecutionEnvironment::Container => Self::Container,
            ExecutionEnvironment::Local => Self::Local,
        }
    }
}

impl LaunchProfile {
    fn args(self) -> &'static [&'static str] {
        match self {
            Self::Container => &[
                "--headless=new",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--no-first-run",
                "--disable-extensions",
            ],
            Self::Local => &[
                "--headless=new",
                "--disable-blink-features=AutomationControlled",
                "--window-size=1920,1080",
                "--no-first-run",
                "--disable-extensions",
                "--disable-popup-blocking",
            ],
        }
    }
}

/// Opens one headless Chromium process per session.
///
/// Each session gets its own browser and its own throwaway profile
/// directory, so sessions never share cookies or a profile lock. The
/// orchestrator's limiter bounds how many exist at once.
///
/// # Example
///
/// ```rust,no_run
/// use jobscout_client::{ChromiumSessionProvider, LaunchProfile};
/// use jobscout_core::traits::{Session, SessionProvider};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ChromiumSessionProvider::new(LaunchProfile::Local);
/// let mut session = provider.open().await?;
/// session.navigate("https://example.com").await?;
/// let html = session.content().await?;
/// session.close().await;
/// println!("{}", &html[..200]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChromiumSessionProvider {
    profile: LaunchProfile,
    chrome_bin: Option<PathBuf>,
}

impl ChromiumSessionProvider {
    pub fn new(profile: LaunchProfile) -> Self {
        Self {
            profile,
            chrome_bin: None,
        }
    }

    /// Use this binary instead of searching the usual install locations.
    pub fn with_chrome_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.chrome_bin = Some(bin.into());
        self
    }

    pub fn profile(&self) -> LaunchProfile {
        self.profile
    }

    fn build_config(&self, data_dir: &TempDir) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .user_data_dir(data_dir.path());

        if self.profile == LaunchProfile::Container {
            builder = builder.no_sandbox();
        }

        if let Some(bin) = self.chrome_binary() {
            tracing::debug!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        for arg in self.profile.args() {
            builder = builder.arg(*arg);
        }
        if self.profile == LaunchProfile::Local {
            builder = builder.arg(format!("--user-agent={STEALTH_USER_AGENT}"));
        }

        builder
            .build()
            .map_err(|e| AppError::SessionUnavailable(format!("Browser config error: {e}")))
    }

    /// Locate the real Chrome/Chromium binary.
    ///
    /// The snap wrapper at `/snap/bin/chromium` strips unknown CLI flags, so
    /// the binary inside the snap is tried first. `None` lets
    /// `chromiumoxide` do its own lookup.
    fn chrome_binary(&self) -> Option<PathBuf> {
        if let Some(bin) = &self.chrome_bin
            && bin.exists()
        {
            return Some(bin.clone());
        }

        const CANDIDATES: &[&str] = &[
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
    }
}

impl SessionProvider for ChromiumSessionProvider {
    type Session = ChromiumSession;

    async fn open(&self) -> Result<ChromiumSession, AppError> {
        let data_dir = tempfile::Builder::new()
            .prefix("jobscout-chromium-")
            .tempdir()
            .map_err(|e| {
                AppError::SessionUnavailable(format!("Failed to create profile dir: {e}"))
            })?;
        let config = self.build_config(&data_dir)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::SessionUnavailable(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::debug!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let mut session = ChromiumSession {
            browser,
            page: None,
            handler_task,
            _data_dir: data_dir,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                session.page = Some(page);
                tracing::debug!(profile = ?self.profile, "Browser session opened");
                Ok(session)
            }
            Err(e) => {
                session.close().await;
                Err(AppError::SessionUnavailable(format!(
                    "Failed to open browser tab: {e}"
                )))
            }
        }
    }
}

/// A running Chromium process with a single tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    _data_dir: TempDir,
}

impl ChromiumSession {
    fn page(&self) -> Result<Page, AppError> {
        self.page
            .clone()
            .ok_or_else(|| AppError::NavigationError("Browser tab is not open".into()))
    }
}

impl Session for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), AppError> {
        self.page()?
            .goto(url)
            .await
            .map_err(|e| AppError::NavigationError(format!("Failed to navigate to {url}: {e}")))?;
        Ok(())
    }

    async fn scroll_by(&mut self, pixels: u32) -> Result<(), AppError> {
        self.page()?
            .evaluate(format!("window.scrollBy(0, {pixels});"))
            .await
            .map_err(|e| AppError::NavigationError(format!("Scroll failed: {e}")))?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, AppError> {
        self.page()?
            .content()
            .await
            .map_err(|e| AppError::NavigationError(format!("Failed to read page content: {e}")))
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Browser close failed: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        tracing::debug!("Browser session closed");
    }
}
