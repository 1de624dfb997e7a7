use std::time::Duration;

use log::{debug, info, warn};

use super::client::LoginBackend;
use super::session::{Admission, LoginSession};
use crate::error::Result;

/// Source of the pause between queue polls.
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drives a login through the delayed-entry queue until it succeeds or fails.
///
/// `Delayed` answers are re-submitted with their queue token after a fixed
/// interval. There is no attempt limit: a server that keeps answering
/// `delayed` keeps the poller waiting.
pub struct QueuePoller<'a, B, S> {
    backend: &'a B,
    sleeper: &'a S,
    interval: Duration,
}

impl<'a, B: LoginBackend, S: Sleeper> QueuePoller<'a, B, S> {
    pub fn new(backend: &'a B, sleeper: &'a S, interval: Duration) -> Self {
        Self {
            backend,
            sleeper,
            interval,
        }
    }

    pub async fn wait_for_admission(&self, mut session: LoginSession) -> Result<Admission> {
        let mut polls = 0u64;
        loop {
            session = match session {
                LoginSession::Success(game) => {
                    debug!("queue: admitted after {polls} polls");
                    return Ok(Admission::Admitted(game));
                }
                LoginSession::Failed { reason } => {
                    warn!("queue: login refused: {reason}");
                    return Ok(Admission::Refused { reason });
                }
                LoginSession::Delayed {
                    queue_token,
                    eta,
                    position,
                } => {
                    info!("in queue: position {position}, eta {eta}s");
                    self.sleeper.sleep(self.interval).await;
                    polls += 1;
                    self.backend.refresh(&queue_token).await?
                }
            };
        }
    }
}
