//! Login against the remote API, including the delayed-entry queue.

pub mod client;
pub mod queue;
pub mod session;

pub use client::{AuthClient, LoginBackend};
pub use queue::{QueuePoller, Sleeper, TokioSleeper};
pub use session::{Admission, GameSession};
