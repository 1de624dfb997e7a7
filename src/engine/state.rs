use std::fmt;

/// Player credentials for the first login attempt.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Go straight to login without touching the installation.
    pub skip_update: bool,
    /// Synchronise the installation and stop before logging in.
    pub update_only: bool,
}

/// How a launch attempt ended when no fatal error occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched,
    Refused { reason: String },
    Updated { files: usize },
}
