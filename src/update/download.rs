use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use futures_util::StreamExt;
use log::{debug, info, warn};
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tokio::task;

use super::bunzip::{BunzipError, BunzipWriter};
use super::diff::UpdatePlanItem;
use crate::error::{LauncherError, Result};
use crate::networking::{NetworkClient, transport};

/// Network chunks buffered ahead of the decompressor.
const CHUNK_QUEUE: usize = 16;

#[derive(Clone, Debug)]
pub struct ProgressUpdate {
    pub file: String,
    /// Compressed bytes received so far.
    pub downloaded: u64,
    /// Compressed size, when the server announced one.
    pub total: Option<u64>,
    pub finished: bool,
}

pub type ProgressCallback<'a> = Option<&'a mut (dyn FnMut(ProgressUpdate) + Send)>;

fn emit_progress(cb: &mut ProgressCallback<'_>, update: ProgressUpdate) {
    if let Some(callback) = cb.as_deref_mut() {
        callback(update);
    }
}

/// Fetches planned files and installs them atomically.
#[derive(Clone)]
pub struct Downloader {
    http: NetworkClient,
}

impl Downloader {
    pub fn new(http: NetworkClient) -> Self {
        Self { http }
    }

    /// Download every item in order, stopping at the first failure.
    pub async fn download_all(
        &self,
        plan: &[UpdatePlanItem],
        mut progress: ProgressCallback<'_>,
    ) -> Result<()> {
        for (idx, item) in plan.iter().enumerate() {
            info!("update: [{}/{}] {}", idx + 1, plan.len(), item.name);
            self.download(item, &mut progress).await?;
        }
        Ok(())
    }

    /// Fetch `item.url`, decompress it into a temporary sibling of `item.path`,
    /// check the digest and move it into place. The destination is untouched
    /// unless every step succeeds.
    ///
    /// Decompression and file writes run on the blocking pool; this task only
    /// moves network chunks across and reports progress.
    pub async fn download(
        &self,
        item: &UpdatePlanItem,
        progress: &mut ProgressCallback<'_>,
    ) -> Result<()> {
        debug!("download: {} -> {}", item.url, item.path.display());
        let dir = item
            .path
            .parent()
            .ok_or_else(|| LauncherError::decode("plan item", "destination has no parent"))?
            .to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LauncherError::io("create directory", &dir, e))?;

        let response = self.http.get(&item.url).await?;
        let total = response.content_length();

        let (chunks, queue) = mpsc::channel(CHUNK_QUEUE);
        let target = item.clone();
        let installer = task::spawn_blocking(move || install(&target, &dir, queue));

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let mut failure = None;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    failure = Some(transport(&item.url, e));
                    break;
                }
            };
            downloaded += chunk.len() as u64;
            // A closed queue means the installer already failed; its error is reported below.
            if chunks.send(chunk).await.is_err() {
                break;
            }
            emit_progress(
                progress,
                ProgressUpdate {
                    file: item.name.clone(),
                    downloaded,
                    total,
                    finished: false,
                },
            );
        }
        drop(chunks);

        let installed = installer
            .await
            .map_err(|e| LauncherError::io("install", &item.path, io::Error::other(e)))?;
        if let Some(err) = failure {
            return Err(err);
        }
        let written = installed?;

        emit_progress(
            progress,
            ProgressUpdate {
                file: item.name.clone(),
                downloaded,
                total,
                finished: true,
            },
        );
        debug!(
            "download: {} complete ({} bytes compressed, {} bytes written)",
            item.name, downloaded, written
        );
        Ok(())
    }
}

/// Decompress queued chunks into a temporary file in `dir`, verify the digest
/// and persist it over `item.path`. Returns the number of bytes written.
fn install<B: AsRef<[u8]>>(
    item: &UpdatePlanItem,
    dir: &Path,
    mut queue: mpsc::Receiver<B>,
) -> Result<u64> {
    let staging = NamedTempFile::new_in(dir)
        .map_err(|e| LauncherError::io("create temporary file in", dir, e))?;
    let mut decoder = BunzipWriter::new(HashingWriter::new(BufWriter::new(staging)));
    while let Some(chunk) = queue.blocking_recv() {
        decoder
            .write_compressed(chunk.as_ref())
            .map_err(|e| bunzip_error(item, e))?;
    }

    let hashing = decoder.finish().map_err(|e| bunzip_error(item, e))?;
    let (writer, written, actual) = hashing.finish();
    if item.expected_hash.is_empty() {
        warn!("download: manifest has no hash for {}, skipping verification", item.name);
    } else if !actual.eq_ignore_ascii_case(&item.expected_hash) {
        return Err(LauncherError::ChecksumMismatch {
            name: item.name.clone(),
            expected: item.expected_hash.clone(),
            actual,
        });
    }

    let staging = writer
        .into_inner()
        .map_err(|e| LauncherError::io("write", &item.path, e.into_error()))?;
    staging
        .as_file()
        .sync_all()
        .map_err(|e| LauncherError::io("sync", &item.path, e))?;
    carry_permissions(staging.path(), &item.path)?;
    staging
        .persist(&item.path)
        .map_err(|e| LauncherError::io("replace", &item.path, e.error))?;
    Ok(written)
}

fn bunzip_error(item: &UpdatePlanItem, err: BunzipError) -> LauncherError {
    match err {
        BunzipError::Sink(source) => LauncherError::io("write", &item.path, source),
        other => LauncherError::decode_from(format!("download {}", item.name), other),
    }
}

/// Keep the mode of the file being replaced; fresh files get the usual 0644.
#[cfg(unix)]
fn carry_permissions(staging: &Path, dest: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = match fs::metadata(dest) {
        Ok(meta) => meta.permissions(),
        Err(_) => fs::Permissions::from_mode(0o644),
    };
    fs::set_permissions(staging, permissions)
        .map_err(|e| LauncherError::io("set permissions on", staging, e))
}

#[cfg(not(unix))]
fn carry_permissions(_staging: &Path, _dest: &Path) -> Result<()> {
    Ok(())
}

/// Forwards writes to `inner` while hashing everything that passes through.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha1,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
            written: 0,
        }
    }

    fn finish(self) -> (W, u64, String) {
        (self.inner, self.written, format!("{:x}", self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
