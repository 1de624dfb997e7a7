use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, trace, warn};

use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};
use crate::login::GameSession;

pub const GAMESERVER_ENV: &str = "TTR_GAMESERVER";
pub const PLAYCOOKIE_ENV: &str = "TTR_PLAYCOOKIE";

/// Hands an admitted session over to the game client.
pub trait GameLauncher {
    fn launch(&self, session: &GameSession) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    install_dir: PathBuf,
    executable: PathBuf,
    pipe: bool,
}

impl ProcessLauncher {
    pub fn new(config: &LauncherConfig, pipe: bool) -> Self {
        Self {
            install_dir: config.install_dir.clone(),
            executable: config.executable_path(),
            pipe,
        }
    }

    fn command(&self, session: &GameSession) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.current_dir(&self.install_dir);
        cmd.envs(session_env(session));
        cmd.stdin(Stdio::null());
        if self.pipe {
            cmd.stdout(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
        }
        cmd.stderr(Stdio::inherit());
        cmd
    }
}

impl GameLauncher for ProcessLauncher {
    fn launch(&self, session: &GameSession) -> Result<()> {
        if !self.executable.is_file() {
            warn!("launch: engine not found at {}", self.executable.display());
            return Err(LauncherError::Launch {
                path: self.executable.clone(),
                reason: "game executable is missing".into(),
            });
        }

        if let Err(e) = mark_executable(&self.executable) {
            warn!(
                "launch: could not mark {} executable: {e}",
                self.executable.display()
            );
        }

        debug!(
            "launch: starting {} in {} (gameserver {})",
            self.executable.display(),
            self.install_dir.display(),
            session.gameserver
        );
        trace!("launch: play cookie {}", session.cookie);

        let mut child = self
            .command(session)
            .spawn()
            .map_err(|e| LauncherError::Launch {
                path: self.executable.clone(),
                reason: e.to_string(),
            })?;
        info!("launch: process started (pid {})", child.id());

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(|line| line.ok()) {
                trace!("game: {line}");
            }
            let status = child
                .wait()
                .map_err(|e| LauncherError::io("wait for", &self.executable, e))?;
            info!("launch: game exited with {status}");
        }
        Ok(())
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Variables added on top of the inherited environment.
pub fn session_env(session: &GameSession) -> [(&'static str, &str); 2] {
    [
        (GAMESERVER_ENV, session.gameserver.as_str()),
        (PLAYCOOKIE_ENV, session.cookie.as_str()),
    ]
}
