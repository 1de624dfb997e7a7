//! Bringing an installation in line with the remote manifest.
//!
//! The flow is strictly one way: [`ManifestClient::fetch`] returns the remote
//! index, [`DiffEngine::plan`] compares it with what is on disk, and
//! [`Downloader`] installs every planned file in order.

mod bunzip;
pub mod diff;
pub mod download;
pub mod local;
pub mod manifest;

pub use diff::DiffEngine;
pub use download::{Downloader, ProgressCallback, ProgressUpdate};
pub use manifest::ManifestClient;
