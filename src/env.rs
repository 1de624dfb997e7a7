use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LauncherError, Result};

pub const PLATFORM_WIN32: &str = "win32";
pub const PLATFORM_WIN64: &str = "win64";
pub const PLATFORM_DARWIN: &str = "darwin";
pub const PLATFORM_LINUX: &str = "linux";

const GAME_DIR_NAME: &str = "Toontown Rewritten";

/// Platform identifier as used by the manifest's `only` lists.
pub fn current_platform() -> &'static str {
    if cfg!(target_os = "windows") {
        if cfg!(target_pointer_width = "64") {
            PLATFORM_WIN64
        } else {
            PLATFORM_WIN32
        }
    } else if cfg!(target_os = "macos") {
        PLATFORM_DARWIN
    } else if cfg!(target_os = "linux") {
        PLATFORM_LINUX
    } else {
        env::consts::OS
    }
}

/// Returns the conventional installation directory for `platform`.
pub fn default_install_dir(platform: &str) -> PathBuf {
    let home = || {
        env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    match platform {
        PLATFORM_WIN32 => PathBuf::from(r"C:\Program Files").join(GAME_DIR_NAME),
        PLATFORM_WIN64 => PathBuf::from(r"C:\Program Files (x86)").join(GAME_DIR_NAME),
        PLATFORM_DARWIN => home()
            .join("Library")
            .join("Application Support")
            .join(GAME_DIR_NAME),
        _ => home().join(GAME_DIR_NAME),
    }
}

/// File name of the engine binary shipped for `platform`.
pub fn executable_name(platform: &str) -> &'static str {
    match platform {
        PLATFORM_WIN32 => "TTREngine.exe",
        PLATFORM_WIN64 => "TTREngine64.exe",
        PLATFORM_DARWIN => "Toontown Rewritten",
        _ => "TTREngine",
    }
}

pub fn executable_path(install_dir: &Path, platform: &str) -> PathBuf {
    install_dir.join(executable_name(platform))
}

/// Create the installation directory if it is missing.
pub fn ensure_install_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| LauncherError::io("create install directory", dir, e))
}
