//! # Redis List Sink
//!
//! Uses a Redis list as the queue: every message is `RPUSH`ed onto the key
//! named by the queue, so consumers `BLPOP` them in publish order.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use url::Url;

use crate::core::sink::{BrokerConfig, BrokerSink, SinkError};

/// Builds the Redis URL for `config`. A bare `host[:port]` gets the `redis`
/// scheme; credentials, when configured, replace any in the URL.
pub fn redis_url(config: &BrokerConfig) -> Result<String, SinkError> {
    let connect_err = |reason: String| SinkError::Connect { host: config.host.clone(), reason };

    let raw = if config.host.contains("://") {
        config.host.clone()
    } else {
        format!("redis://{}/", config.host.trim_end_matches('/'))
    };
    let mut url = Url::parse(&raw).map_err(|e| connect_err(e.to_string()))?;
    if !matches!(url.scheme(), "redis" | "rediss") {
        return Err(connect_err(format!("unsupported scheme {:?}", url.scheme())));
    }

    if let Some(creds) = &config.credentials {
        url.set_username(&creds.user).map_err(|_| connect_err("cannot set user".into()))?;
        url.set_password(Some(&creds.password)).map_err(|_| connect_err("cannot set password".into()))?;
    }
    Ok(url.to_string())
}

/// # Redis Sink
pub struct RedisSink {
    host: String,
    connection: Option<ConnectionManager>,
    destination: Option<String>,
}

impl RedisSink {
    /// Opens a managed connection to the server.
    ///
    /// # Errors
    /// Returns `SinkError::Connect` when the server cannot be reached.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, SinkError> {
        let connect_err = |e: redis::RedisError| SinkError::Connect { host: config.host.clone(), reason: e.to_string() };

        let client = Client::open(redis_url(config)?).map_err(connect_err)?;
        let connection = ConnectionManager::new(client).await.map_err(connect_err)?;
        log::debug!("Connected to Redis at {}", config.host);

        Ok(Self { host: config.host.clone(), connection: Some(connection), destination: None })
    }

    fn connection(&mut self) -> Result<&mut ConnectionManager, SinkError> {
        let host = &self.host;
        self.connection.as_mut().ok_or_else(|| SinkError::Connect {
            host: host.clone(),
            reason: "connection already closed".into(),
        })
    }
}

/// Redis key types a queue name may already have.
fn is_usable_type(kind: &str) -> bool {
    matches!(kind, "none" | "list")
}

#[async_trait]
impl BrokerSink for RedisSink {
    async fn ensure_destination(&mut self, name: &str) -> Result<(), SinkError> {
        let declare_err = |reason: String| SinkError::Declare { queue: name.to_string(), reason };

        let conn = self.connection()?;
        let kind: String = redis::cmd("TYPE")
            .arg(name)
            .query_async(conn)
            .await
            .map_err(|e| declare_err(e.to_string()))?;
        if !is_usable_type(&kind) {
            return Err(declare_err(format!("key holds a {}, not a list", kind)));
        }

        self.destination = Some(name.to_string());
        Ok(())
    }

    async fn publish(&mut self, message: &str) -> Result<(), SinkError> {
        let destination = self.destination.clone().ok_or(SinkError::NoDestination)?;
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| SinkError::Publish("connection closed".into()))?;

        let _len: i64 = redis::cmd("RPUSH")
            .arg(&destination)
            .arg(message)
            .query_async(conn)
            .await
            .map_err(|e| SinkError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if self.connection.take().is_some() {
            log::debug!("Disconnected from Redis at {}", self.host);
        }
        self.destination = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::{BrokerKind, Credentials};

    fn config(host: &str, credentials: Option<Credentials>) -> BrokerConfig {
        BrokerConfig { host: host.into(), queue: "q".into(), credentials, kind: BrokerKind::Redis }
    }

    #[test]
    fn test_bare_host() {
        assert_eq!(redis_url(&config("cache:6379", None)).unwrap(), "redis://cache:6379/");
    }

    #[test]
    fn test_credentials_replace_url_login() {
        let creds = Credentials { user: "loader".into(), password: "pw".into() };
        let url = redis_url(&config("rediss://old:x@cache:6380/2", Some(creds))).unwrap();
        assert_eq!(url, "rediss://loader:pw@cache:6380/2");
    }

    #[test]
    fn test_only_lists_are_usable() {
        assert!(is_usable_type("none"));
        assert!(is_usable_type("list"));
        assert!(!is_usable_type("string"));
        assert!(!is_usable_type("hash"));
    }

    #[test]
    fn test_amqp_scheme_is_rejected() {
        assert!(redis_url(&config("amqp://mq", None)).is_err());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut sink = RedisSink { host: "localhost".into(), connection: None, destination: Some("q".into()) };
        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(sink.publish("{}").await, Err(SinkError::NoDestination));
    }
}
