use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

mod config;
mod engine;
mod env;
mod error;
mod login;
mod networking;
mod process;
mod progress;
mod update;

use config::LauncherConfig;
use engine::{Credentials, LaunchOutcome, LauncherEngine, RunOptions};
use error::{LauncherError, Result};
use progress::DownloadProgress;
use update::{ProgressCallback, ProgressUpdate};

#[derive(Parser, Debug)]
#[command(
    name = "ttr-launcher",
    author,
    version,
    about = "Keeps a Toontown Rewritten install up to date and logs you into the game"
)]
struct Cli {
    /// Account name used for the first login request.
    #[arg(short, long, required_unless_present = "update_only")]
    username: Option<String>,

    /// Account password. Prompting is not supported; pass it here or via the environment.
    #[arg(short, long, env = "TTR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Game installation directory. Defaults to the platform's usual location.
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Platform whose files to install (win32, win64, darwin, linux). Defaults to this machine.
    #[arg(long)]
    platform: Option<String>,

    /// Log in without checking game files first.
    #[arg(long, conflicts_with = "update_only")]
    skip_update: bool,

    /// Only synchronise game files.
    #[arg(long)]
    update_only: bool,

    /// Forward the game's stdout into the launcher log and wait for it to exit.
    #[arg(long)]
    pipe: bool,

    /// Seconds between queue polls.
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Read timeout in seconds for every request.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[arg(long, default_value = config::MANIFEST_URL)]
    manifest_url: String,

    #[arg(long, default_value = config::PATCHES_URL)]
    patches_url: String,

    #[arg(long, default_value = config::LOGIN_URL)]
    login_url: String,

    /// Show per-file decisions and request details.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> LauncherConfig {
        let config = LauncherConfig::default()
            .with_manifest_url(&self.manifest_url)
            .with_patches_url(&self.patches_url)
            .with_login_url(&self.login_url)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_poll_interval(Duration::from_secs(self.poll_interval));
        let config = match &self.platform {
            Some(platform) => config.with_platform(platform),
            None => config,
        };
        match &self.dir {
            Some(dir) => config.with_install_dir(dir),
            None => config,
        }
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            skip_update: self.skip_update,
            update_only: self.update_only,
        }
    }

    fn credentials(&self) -> Result<Credentials> {
        if self.update_only {
            return Ok(Credentials {
                username: self.username.clone().unwrap_or_default(),
                password: String::new(),
            });
        }
        let username = self
            .username
            .clone()
            .ok_or_else(|| LauncherError::Config("a username is required to log in".into()))?;
        let password = self.password.clone().ok_or_else(|| {
            LauncherError::Config("a password is required (--password or TTR_PASSWORD)".into())
        })?;
        Ok(Credentials { username, password })
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,ttr_launcher=trace"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

async fn run(cli: &Cli) -> Result<LaunchOutcome> {
    let credentials = cli.credentials()?;
    let engine = LauncherEngine::from_config(cli.config(), cli.pipe)?;

    let mut bars = DownloadProgress::new(!cli.verbose);
    let mut render = |update: ProgressUpdate| bars.update(update);
    let progress: ProgressCallback<'_> = Some(&mut render);

    engine.run(&credentials, cli.options(), progress).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(LaunchOutcome::Launched) => ExitCode::SUCCESS,
        Ok(LaunchOutcome::Updated { files }) => {
            info!("{files} files updated, not logging in");
            ExitCode::SUCCESS
        }
        Ok(LaunchOutcome::Refused { .. }) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
