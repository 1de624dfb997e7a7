use log::trace;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};

/// Thin wrapper over `reqwest` that applies the launcher's timeouts and user agent
/// and sorts failures into transport, protocol and decode errors.
#[derive(Clone, Debug)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    pub fn new(config: &LauncherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(LauncherError::Client)?;
        Ok(Self { client })
    }

    /// GET `url` and require a success status.
    pub async fn get(&self, url: &str) -> Result<Response> {
        trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| transport(url, source))?;
        check_status(url, response)
    }

    /// POST `fields` form-encoded to `url` and require a success status.
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Response> {
        trace!("POST {url}");
        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|source| transport(url, source))?;
        check_status(url, response)
    }

    /// Read the whole body and parse it as JSON.
    pub async fn json<T: DeserializeOwned>(&self, what: &str, response: Response) -> Result<T> {
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|source| transport(&url, source))?;
        serde_json::from_str(&body).map_err(|e| {
            trace!("undecodable {what} body: {}", snippet(&body));
            LauncherError::decode_from(what, e)
        })
    }
}

pub(crate) fn transport(url: &str, source: reqwest::Error) -> LauncherError {
    LauncherError::Transport {
        url: url.to_owned(),
        source,
    }
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::Protocol {
            url: url.to_owned(),
            status,
        });
    }
    trace!("{url}: {status}");
    Ok(response)
}

fn snippet(body: &str) -> &str {
    const LIMIT: usize = 256;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Status {
        open: bool,
    }

    fn client() -> NetworkClient {
        NetworkClient::new(&LauncherConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/status")
                    .header_exists("user-agent");
                then.status(200).body(r#"{"open":true}"#);
            })
            .await;

        let client = client();
        let response = client.get(&server.url("/status")).await.unwrap();
        let status: Status = client.json("status", response).await.unwrap();
        assert!(status.open);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn maps_error_status_to_protocol_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let err = client().get(&server.url("/missing")).await.unwrap_err();
        assert!(matches!(
            err,
            LauncherError::Protocol { status, .. } if status.as_u16() == 404
        ));
    }

    #[tokio::test]
    async fn maps_connection_failure_to_transport_error() {
        let err = client().get("http://127.0.0.1:1/").await.unwrap_err();
        assert!(matches!(err, LauncherError::Transport { .. }));
    }

    #[test]
    fn truncates_long_bodies_for_logging() {
        let body = "x".repeat(1_000);
        assert_eq!(snippet(&body).len(), 256);
        assert_eq!(snippet("short"), "short");
    }
}
