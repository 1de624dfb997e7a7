use std::collections::{BTreeMap, HashMap};

use log::{debug, info};
use serde::{Deserialize, Deserializer};

use crate::config::LauncherConfig;
use crate::error::Result;
use crate::networking::NetworkClient;

/// Remote index of distributable files, keyed by logical file name.
pub type Manifest = BTreeMap<String, ManifestEntry>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    /// Download path relative to the patches base URL.
    pub dl: String,
    /// Platforms this file ships for; empty means every platform.
    #[serde(default, deserialize_with = "null_as_default")]
    pub only: Vec<String>,
    /// Hex SHA-1 of the decompressed file.
    pub hash: String,
    #[serde(rename = "compHash", default)]
    pub comp_hash: String,
    /// Delta patches keyed by the source hash. Not applied by the launcher.
    #[serde(default, deserialize_with = "null_as_default")]
    pub patches: HashMap<String, PatchEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PatchEntry {
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "patchHash", default)]
    pub patch_hash: String,
    #[serde(rename = "compPatchHash", default)]
    pub comp_patch_hash: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ManifestEntry {
    pub fn applies_to(&self, platform: &str) -> bool {
        self.only.is_empty() || self.only.iter().any(|p| p == platform)
    }
}

#[derive(Clone)]
pub struct ManifestClient {
    http: NetworkClient,
    url: String,
}

impl ManifestClient {
    pub fn new(http: NetworkClient, config: &LauncherConfig) -> Self {
        Self {
            http,
            url: config.manifest_url.clone(),
        }
    }

    pub async fn fetch(&self) -> Result<Manifest> {
        info!("manifest: fetching {}", self.url);
        let response = self.http.get(&self.url).await?;
        let manifest: Manifest = self.http.json("manifest", response).await?;
        debug!("manifest: {} entries", manifest.len());
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LauncherError;
    use httpmock::prelude::*;

    const SAMPLE: &str = r#"{
        "patcher.exe": {"dl": "patcher.bz2", "only": ["win64"], "hash": "abc123"},
        "phase_3.mf": {
            "dl": "phase_3.mf.bz2",
            "hash": "d1",
            "compHash": "c1",
            "patches": {
                "d0": {"filename": "phase_3.mf.d0.patch.bz2", "patchHash": "p0", "compPatchHash": "cp0"}
            }
        }
    }"#;

    fn client_for(server: &MockServer) -> ManifestClient {
        let config = LauncherConfig::default().with_manifest_url(server.url("/patchmanifest.txt"));
        ManifestClient::new(NetworkClient::new(&config).unwrap(), &config)
    }

    #[test]
    fn parses_manifest_fields() {
        let manifest: Manifest = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.len(), 2);

        let patcher = &manifest["patcher.exe"];
        assert_eq!(patcher.dl, "patcher.bz2");
        assert_eq!(patcher.only, vec!["win64".to_string()]);
        assert!(patcher.comp_hash.is_empty());
        assert!(patcher.patches.is_empty());

        let phase = &manifest["phase_3.mf"];
        assert!(phase.only.is_empty());
        assert_eq!(phase.comp_hash, "c1");
        assert_eq!(phase.patches["d0"].patch_hash, "p0");
    }

    #[test]
    fn platform_restriction() {
        let manifest: Manifest = serde_json::from_str(SAMPLE).unwrap();
        assert!(manifest["patcher.exe"].applies_to("win64"));
        assert!(!manifest["patcher.exe"].applies_to("darwin"));
        assert!(manifest["phase_3.mf"].applies_to("darwin"));
    }

    #[test]
    fn null_lists_mean_unrestricted() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"a": {"dl": "a.bz2", "only": null, "hash": "h", "patches": null}}"#)
                .unwrap();
        assert!(manifest["a"].only.is_empty());
        assert!(manifest["a"].applies_to("linux"));
    }

    #[tokio::test]
    async fn fetches_manifest_over_http() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/patchmanifest.txt");
                then.status(200).body(SAMPLE);
            })
            .await;

        let manifest = client_for(&server).fetch().await.unwrap();
        assert_eq!(manifest["phase_3.mf"].hash, "d1");
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn bad_status_is_protocol_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/patchmanifest.txt");
                then.status(500);
            })
            .await;

        let err = client_for(&server).fetch().await.unwrap_err();
        assert!(matches!(err, LauncherError::Protocol { .. }));
    }

    #[tokio::test]
    async fn malformed_json_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/patchmanifest.txt");
                then.status(200).body("{not json");
            })
            .await;

        let err = client_for(&server).fetch().await.unwrap_err();
        assert!(matches!(err, LauncherError::Decode { what, .. } if what == "manifest"));
    }
}
