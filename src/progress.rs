//! Terminal rendering for download progress.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::update::ProgressUpdate;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} {msg}";

/// One bar per file, replaced when the downloader moves on.
pub struct DownloadProgress {
    enabled: bool,
    current: Option<(String, ProgressBar)>,
}

impl DownloadProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: None,
        }
    }

    pub fn update(&mut self, update: ProgressUpdate) {
        let stale = self
            .current
            .as_ref()
            .is_some_and(|(file, _)| *file != update.file);
        if stale {
            self.clear();
        }

        let (_, bar) = self
            .current
            .get_or_insert_with(|| (update.file.clone(), new_bar(self.enabled, &update)));
        if let Some(total) = update.total {
            bar.set_length(total);
        }
        bar.set_position(update.downloaded);

        if update.finished {
            self.clear();
        }
    }

    #[cfg(test)]
    fn current_file(&self) -> Option<&str> {
        self.current.as_ref().map(|(file, _)| file.as_str())
    }

    fn clear(&mut self) {
        if let Some((_, bar)) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for DownloadProgress {
    fn drop(&mut self) {
        self.clear();
    }
}

fn new_bar(enabled: bool, update: &ProgressUpdate) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let bar = match update.total {
        Some(total) => {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
                bar.set_style(style);
            }
            bar
        }
    };
    bar.set_message(update.file.clone());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(file: &str, downloaded: u64, finished: bool) -> ProgressUpdate {
        ProgressUpdate {
            file: file.into(),
            downloaded,
            total: Some(100),
            finished,
        }
    }

    #[test]
    fn tracks_the_file_being_downloaded() {
        let mut progress = DownloadProgress::new(false);
        assert_eq!(progress.current_file(), None);

        progress.update(update("phase_3.mf", 10, false));
        assert_eq!(progress.current_file(), Some("phase_3.mf"));

        progress.update(update("phase_4.mf", 5, false));
        assert_eq!(progress.current_file(), Some("phase_4.mf"));
    }

    #[test]
    fn finished_file_clears_the_bar() {
        let mut progress = DownloadProgress::new(false);
        progress.update(update("phase_3.mf", 50, false));
        progress.update(update("phase_3.mf", 100, true));
        assert_eq!(progress.current_file(), None);
    }

    #[test]
    fn bar_follows_reported_position() {
        let mut progress = DownloadProgress::new(false);
        progress.update(update("phase_3.mf", 42, false));
        let (_, bar) = progress.current.as_ref().unwrap();
        assert_eq!(bar.position(), 42);
        assert_eq!(bar.length(), Some(100));
    }
}
