use log::{info, warn};

use crate::config::LauncherConfig;
use crate::env;
use crate::error::Result;
use crate::login::{Admission, AuthClient, LoginBackend, QueuePoller, Sleeper, TokioSleeper};
use crate::networking::NetworkClient;
use crate::process::{GameLauncher, ProcessLauncher};
use crate::update::{DiffEngine, Downloader, ManifestClient, ProgressCallback};

pub mod state;

pub use state::{Credentials, LaunchOutcome, RunOptions};

/// Runs update, login and handoff in sequence, stopping at the first fatal error.
pub struct LauncherEngine<B, S, L> {
    config: LauncherConfig,
    manifest: ManifestClient,
    diff: DiffEngine,
    downloader: Downloader,
    backend: B,
    sleeper: S,
    launcher: L,
}

impl LauncherEngine<AuthClient, TokioSleeper, ProcessLauncher> {
    /// Production wiring: HTTP login, real sleeps, and a spawned game process.
    pub fn from_config(config: LauncherConfig, pipe: bool) -> Result<Self> {
        config.validate()?;
        let http = NetworkClient::new(&config)?;
        let backend = AuthClient::new(http.clone(), &config);
        let launcher = ProcessLauncher::new(&config, pipe);
        Ok(Self::assemble(config, http, backend, TokioSleeper, launcher))
    }
}

impl<B: LoginBackend, S: Sleeper, L: GameLauncher> LauncherEngine<B, S, L> {
    pub fn new(config: LauncherConfig, backend: B, sleeper: S, launcher: L) -> Result<Self> {
        config.validate()?;
        let http = NetworkClient::new(&config)?;
        Ok(Self::assemble(config, http, backend, sleeper, launcher))
    }

    fn assemble(
        config: LauncherConfig,
        http: NetworkClient,
        backend: B,
        sleeper: S,
        launcher: L,
    ) -> Self {
        Self {
            manifest: ManifestClient::new(http.clone(), &config),
            diff: DiffEngine::new(config.platform.clone()),
            downloader: Downloader::new(http),
            config,
            backend,
            sleeper,
            launcher,
        }
    }

    pub async fn run(
        &self,
        credentials: &Credentials,
        options: RunOptions,
        progress: ProgressCallback<'_>,
    ) -> Result<LaunchOutcome> {
        if options.skip_update {
            info!("skipping update check");
        } else {
            let files = self.update(progress).await?;
            if options.update_only {
                return Ok(LaunchOutcome::Updated { files });
            }
        }

        match self.login(credentials).await? {
            Admission::Admitted(session) => {
                info!("entering the game, have fun!");
                self.launcher.launch(&session)?;
                Ok(LaunchOutcome::Launched)
            }
            Admission::Refused { reason } => {
                warn!("could not log in: {reason}");
                Ok(LaunchOutcome::Refused { reason })
            }
        }
    }

    /// Bring the installation in line with the manifest. Returns how many files
    /// were downloaded.
    pub async fn update(&self, progress: ProgressCallback<'_>) -> Result<usize> {
        let dir = &self.config.install_dir;
        env::ensure_install_dir(dir)?;
        info!(
            "checking {} for updates ({})",
            dir.display(),
            self.diff.platform()
        );

        let manifest = self.manifest.fetch().await?;
        let plan = self.diff.plan(&manifest, &self.config.patches_url, dir)?;
        if plan.is_empty() {
            info!("game files are up to date");
            return Ok(0);
        }

        info!("{} files to download", plan.len());
        self.downloader.download_all(&plan, progress).await?;
        info!("update complete");
        Ok(plan.len())
    }

    /// Log in and wait out the queue.
    pub async fn login(&self, credentials: &Credentials) -> Result<Admission> {
        info!("logging in as {}", credentials.username);
        let session = self
            .backend
            .login(&credentials.username, &credentials.password)
            .await?;
        if !session.is_terminal() {
            info!("login delayed, waiting in the queue");
        }
        QueuePoller::new(&self.backend, &self.sleeper, self.config.poll_interval)
            .wait_for_admission(session)
            .await
    }
}
