use log::{debug, trace};

use super::session::LoginSession;
use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};
use crate::networking::{NetworkClient, transport};

const FORMAT_FIELD: (&str, &str) = ("format", "json");

/// Anything that can answer login and queue-poll requests.
pub trait LoginBackend {
    /// First attempt with the player's credentials.
    async fn login(&self, username: &str, password: &str) -> Result<LoginSession>;

    /// Ask again for a request that was placed in the queue.
    async fn refresh(&self, queue_token: &str) -> Result<LoginSession>;
}

/// Talks to the remote login API.
#[derive(Clone)]
pub struct AuthClient {
    http: NetworkClient,
    url: String,
}

impl AuthClient {
    pub fn new(http: NetworkClient, config: &LauncherConfig) -> Self {
        Self {
            http,
            url: config.login_url.clone(),
        }
    }

    async fn submit(&self, fields: &[(&str, &str)]) -> Result<LoginSession> {
        let response = self.http.post_form(&self.url, fields).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport(&self.url, e))?;
        let session = LoginSession::parse(&body);
        if let Err(LauncherError::Decode { .. }) = &session {
            trace!("login: unexpected body {body}");
        }
        session
    }
}

impl LoginBackend for AuthClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginSession> {
        debug!("login: attempting login for {username}");
        self.submit(&[
            ("username", username),
            ("password", password),
            FORMAT_FIELD,
        ])
        .await
    }

    async fn refresh(&self, queue_token: &str) -> Result<LoginSession> {
        debug!("login: refreshing queue position");
        trace!("login: queue token {queue_token}");
        self.submit(&[("queueToken", queue_token), FORMAT_FIELD])
            .await
    }
}
