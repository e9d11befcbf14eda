//! # Broker Sink Interface
//!
//! The message broker is an external collaborator. The relay only publishes;
//! connecting, declaring the destination and closing belong to the sink
//! itself and to the coordinator that owns it.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Which broker protocol to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrokerKind {
    /// RabbitMQ over AMQP 0.9.1.
    #[default]
    Amqp,
    /// A Redis list used as a queue.
    Redis,
}

/// Broker login. `Debug` output never shows the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name.
    pub user: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// # Broker Configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Broker host, optionally with `:port` or a full URI.
    pub host: String,
    /// Destination queue name.
    pub queue: String,
    /// Optional login; brokers fall back to their default account.
    pub credentials: Option<Credentials>,
    /// Protocol.
    pub kind: BrokerKind,
}

/// Broker failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The broker cannot be reached or refused the login.
    #[error("Failed to connect to broker at {host}: {reason}")]
    Connect {
        /// Configured host.
        host: String,
        /// Client message.
        reason: String,
    },

    /// The destination cannot be used.
    #[error("Failed to declare destination {queue}: {reason}")]
    Declare {
        /// Queue name.
        queue: String,
        /// Broker message.
        reason: String,
    },

    /// `publish` before `ensure_destination`, or after `close`.
    #[error("No destination declared before publishing")]
    NoDestination,

    /// The broker did not accept a message.
    #[error("Broker rejected message: {0}")]
    Publish(String),

    /// Shutdown failed.
    #[error("Failed to close broker connection: {0}")]
    Close(String),
}

/// # Broker Sink
///
/// Publish endpoint owned by the coordinator. `close` must be idempotent.
#[async_trait]
pub trait BrokerSink: Send {
    /// Makes sure `name` exists and makes it the publish destination.
    async fn ensure_destination(&mut self, name: &str) -> Result<(), SinkError>;

    /// Publishes one message to the destination.
    async fn publish(&mut self, message: &str) -> Result<(), SinkError>;

    /// Releases every resource held by the sink.
    async fn close(&mut self) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: BrokerSink + ?Sized> BrokerSink for Box<T> {
    async fn ensure_destination(&mut self, name: &str) -> Result<(), SinkError> {
        (**self).ensure_destination(name).await
    }

    async fn publish(&mut self, message: &str) -> Result<(), SinkError> {
        (**self).publish(message).await
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        (**self).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials { user: "loader".into(), password: "s3cret".into() };
        let shown = format!("{:?}", creds);
        assert!(shown.contains("loader"));
        assert!(!shown.contains("s3cret"));
    }
}
