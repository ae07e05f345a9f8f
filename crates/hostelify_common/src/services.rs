//! Service abstractions for external collaborators.
//!
//! These traits decouple the domain crates from concrete implementations of
//! external services so components can be tested with in-memory fakes and the
//! binary can inject whichever implementation is configured.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result.
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for
/// `Box<dyn std::error::Error + Send + Sync>`.
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// Result of a notification dispatch.
#[derive(Debug, Clone)]
pub struct NotificationResult {
    pub delivered: bool,
    pub message_id: Option<String>,
}

/// A trait for notification dispatch.
///
/// The core treats notification delivery as fire-and-forget; retry policy
/// belongs to the implementation behind this trait.
pub trait NotificationService: Send + Sync {
    /// Error type returned by notification operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send an email notification.
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> BoxFuture<'_, NotificationResult, Self::Error>;
}
