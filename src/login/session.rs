use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{LauncherError, Result};

const OUTCOME_SUCCESS: &str = "true";
const OUTCOME_DELAYED: &str = "delayed";
const OUTCOME_FAILED: &str = "false";

/// Raw body of the login endpoint. Which fields are present depends on `success`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginResponse {
    success: Option<Value>,
    gameserver: Option<String>,
    cookie: Option<String>,
    eta: Option<Value>,
    position: Option<Value>,
    #[serde(rename = "queueToken")]
    queue_token: Option<String>,
    banner: Option<String>,
}

/// Credentials the game client needs to join a gameserver.
#[derive(Clone, PartialEq, Eq)]
pub struct GameSession {
    pub gameserver: String,
    pub cookie: String,
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("gameserver", &self.gameserver)
            .field("cookie", &"<redacted>")
            .finish()
    }
}

/// Result of one login or queue-poll request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginSession {
    Success(GameSession),
    Delayed {
        queue_token: String,
        eta: String,
        position: String,
    },
    Failed {
        reason: String,
    },
}

impl LoginSession {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoginSession::Delayed { .. })
    }

    pub fn parse(body: &str) -> Result<Self> {
        let response: LoginResponse =
            serde_json::from_str(body).map_err(|e| LauncherError::decode_from("login response", e))?;
        Self::try_from(response)
    }
}

impl TryFrom<LoginResponse> for LoginSession {
    type Error = LauncherError;

    fn try_from(response: LoginResponse) -> Result<Self> {
        let tag = match &response.success {
            Some(Value::Bool(true)) => OUTCOME_SUCCESS.to_owned(),
            Some(Value::Bool(false)) => OUTCOME_FAILED.to_owned(),
            Some(Value::String(tag)) => tag.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        match tag.as_str() {
            OUTCOME_SUCCESS => {
                let gameserver = non_empty(response.gameserver);
                let cookie = non_empty(response.cookie);
                match (gameserver, cookie) {
                    (Some(gameserver), Some(cookie)) => {
                        Ok(LoginSession::Success(GameSession { gameserver, cookie }))
                    }
                    _ => Err(LauncherError::decode(
                        "login response",
                        "success without gameserver and cookie",
                    )),
                }
            }
            OUTCOME_DELAYED => {
                let queue_token = non_empty(response.queue_token).ok_or_else(|| {
                    LauncherError::decode("login response", "delayed without queue token")
                })?;
                Ok(LoginSession::Delayed {
                    queue_token,
                    eta: text(response.eta),
                    position: text(response.position),
                })
            }
            OUTCOME_FAILED => Ok(LoginSession::Failed {
                reason: non_empty(response.banner)
                    .unwrap_or_else(|| "login rejected by server".to_owned()),
            }),
            _ => Err(LauncherError::UnknownOutcome(tag)),
        }
    }
}

/// Terminal outcome of the login queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    Admitted(GameSession),
    Refused { reason: String },
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
