use std::path::{Component, Path, PathBuf};

use log::{debug, trace};

use super::local::LocalFileIndex;
use super::manifest::Manifest;
use crate::error::{LauncherError, Result};

/// One file that must be downloaded in this run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatePlanItem {
    pub name: String,
    pub path: PathBuf,
    pub url: String,
    pub expected_hash: String,
}

/// Compares manifest entries with what is installed for one platform.
#[derive(Clone, Debug)]
pub struct DiffEngine {
    platform: String,
    local: LocalFileIndex,
}

impl DiffEngine {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            local: LocalFileIndex,
        }
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Build the list of files that are missing or stale under `local_dir`.
    pub fn plan(
        &self,
        manifest: &Manifest,
        base_url: &str,
        local_dir: &Path,
    ) -> Result<Vec<UpdatePlanItem>> {
        debug!("diff: checking {} for updates", local_dir.display());
        let mut plan = Vec::new();

        for (name, entry) in manifest {
            if !entry.applies_to(&self.platform) {
                trace!("diff: {name} is not shipped for {}, ignoring", self.platform);
                continue;
            }

            if !stays_inside(name) {
                return Err(LauncherError::decode(
                    "manifest",
                    format!("entry {name:?} points outside the install directory"),
                ));
            }

            let path = local_dir.join(name);
            match self.local.inspect(&path)? {
                Some(local) if local.hash.eq_ignore_ascii_case(&entry.hash) => {
                    trace!("diff: {name} up to date");
                    continue;
                }
                Some(local) => {
                    trace!(
                        "diff: {name} out of date (local {}, manifest {}), queueing",
                        local.hash, entry.hash
                    );
                }
                None => trace!("diff: {name} missing, queueing"),
            }

            plan.push(UpdatePlanItem {
                name: name.clone(),
                path,
                url: join_url(base_url, &entry.dl),
                expected_hash: entry.hash.to_ascii_lowercase(),
            });
        }

        debug!("diff: {} of {} files need downloading", plan.len(), manifest.len());
        Ok(plan)
    }
}

fn stays_inside(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn join_url(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}
