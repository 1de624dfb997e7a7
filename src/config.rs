use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::env;
use crate::error::{LauncherError, Result};

pub const MANIFEST_URL: &str = "https://cdn.toontownrewritten.com/content/patchmanifest.txt";
pub const PATCHES_URL: &str = "https://download.toontownrewritten.com/patches";
pub const LOGIN_URL: &str = "https://toontownrewritten.com/api/login?format=json";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Everything the update and login clients need to know about the outside world.
///
/// Built once at startup and handed to each client by reference; nothing here
/// changes after construction.
#[derive(Clone, Debug)]
pub struct LauncherConfig {
    pub manifest_url: String,
    pub patches_url: String,
    pub login_url: String,
    pub user_agent: String,
    /// Time allowed to establish a connection, for every request.
    pub connect_timeout: Duration,
    /// Longest silence tolerated between reads, for every request.
    pub read_timeout: Duration,
    /// Fixed wait between queue polls.
    pub poll_interval: Duration,
    pub platform: String,
    pub install_dir: PathBuf,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let platform = env::current_platform();
        Self {
            manifest_url: MANIFEST_URL.into(),
            patches_url: PATCHES_URL.into(),
            login_url: LOGIN_URL.into(),
            user_agent: format!("ttr-launcher/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            platform: platform.into(),
            install_dir: env::default_install_dir(platform),
        }
    }
}

impl LauncherConfig {
    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    pub fn with_patches_url(mut self, url: impl Into<String>) -> Self {
        self.patches_url = url.into();
        self
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    pub fn executable_path(&self) -> PathBuf {
        env::executable_path(&self.install_dir, &self.platform)
    }

    /// Reject endpoints that are not absolute URLs before any request is made.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("manifest URL", &self.manifest_url),
            ("patches URL", &self.patches_url),
            ("login URL", &self.login_url),
        ] {
            Url::parse(value)
                .map_err(|e| LauncherError::Config(format!("{field} {value:?}: {e}")))?;
        }
        if self.platform.trim().is_empty() {
            return Err(LauncherError::Config("platform must not be empty".into()));
        }
        Ok(())
    }
}
