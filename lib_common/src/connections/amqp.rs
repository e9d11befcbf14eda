//! # RabbitMQ Sink
//!
//! Publishes through the default exchange with the queue name as routing
//! key. The queue is declared durable first; if the broker refuses (usually
//! because a non-durable queue of that name already exists, which also
//! closes the channel) a fresh channel declares it non-durable.

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use url::Url;

use crate::core::sink::{BrokerConfig, BrokerSink, SinkError};

const DEFAULT_USER: &str = "guest";
const DEFAULT_PASSWORD: &str = "guest";
const REPLY_SUCCESS: u16 = 200;

/// Builds the AMQP URI for `config`.
///
/// A bare `host[:port]` gets the `amqp` scheme and the default vhost. A full
/// `amqp://` or `amqps://` URI is used as given. Configured credentials
/// replace any in the URI; without them the guest account is used.
pub fn amqp_uri(config: &BrokerConfig) -> Result<String, SinkError> {
    let connect_err = |reason: String| SinkError::Connect { host: config.host.clone(), reason };

    let raw = if config.host.contains("://") {
        config.host.clone()
    } else {
        format!("amqp://{}/%2f", config.host.trim_end_matches('/'))
    };
    let mut url = Url::parse(&raw).map_err(|e| connect_err(e.to_string()))?;
    if !matches!(url.scheme(), "amqp" | "amqps") {
        return Err(connect_err(format!("unsupported scheme {:?}", url.scheme())));
    }

    let (user, password) = match &config.credentials {
        Some(creds) => (creds.user.as_str(), creds.password.as_str()),
        None if url.username().is_empty() => (DEFAULT_USER, DEFAULT_PASSWORD),
        None => return Ok(url.to_string()),
    };
    url.set_username(user).map_err(|_| connect_err("cannot set user".into()))?;
    url.set_password(Some(password)).map_err(|_| connect_err("cannot set password".into()))?;

    Ok(url.to_string())
}

/// # AMQP Sink
pub struct AmqpSink {
    host: String,
    connection: Option<Connection>,
    channel: Option<Channel>,
    destination: Option<String>,
}

impl AmqpSink {
    /// Connects and opens a channel.
    ///
    /// # Errors
    /// Returns `SinkError::Connect` when the broker cannot be reached.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, SinkError> {
        let uri = amqp_uri(config)?;
        let connect_err = |e: lapin::Error| SinkError::Connect { host: config.host.clone(), reason: e.to_string() };

        let connection = Connection::connect(&uri, ConnectionProperties::default())
            .await
            .map_err(connect_err)?;
        let channel = connection.create_channel().await.map_err(connect_err)?;
        log::debug!("Connected to RabbitMQ at {}", config.host);

        Ok(Self {
            host: config.host.clone(),
            connection: Some(connection),
            channel: Some(channel),
            destination: None,
        })
    }

    fn connection(&self) -> Result<&Connection, SinkError> {
        self.connection.as_ref().ok_or_else(|| SinkError::Connect {
            host: self.host.clone(),
            reason: "connection already closed".into(),
        })
    }
}

async fn declare(channel: &Channel, name: &str, durable: bool) -> Result<(), lapin::Error> {
    channel
        .queue_declare(name, QueueDeclareOptions { durable, ..Default::default() }, FieldTable::default())
        .await
        .map(|_| ())
}

#[async_trait]
impl BrokerSink for AmqpSink {
    async fn ensure_destination(&mut self, name: &str) -> Result<(), SinkError> {
        let declare_err = |e: lapin::Error| SinkError::Declare { queue: name.to_string(), reason: e.to_string() };

        let durable = match &self.channel {
            Some(channel) => match declare(channel, name, true).await {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Durable declare of {} refused ({}); retrying non-durable", name, e);
                    false
                }
            },
            None => false,
        };

        if !durable {
            let channel = self.connection()?.create_channel().await.map_err(declare_err)?;
            declare(&channel, name, false).await.map_err(declare_err)?;
            self.channel = Some(channel);
        }

        self.destination = Some(name.to_string());
        Ok(())
    }

    async fn publish(&mut self, message: &str) -> Result<(), SinkError> {
        let destination = self.destination.as_deref().ok_or(SinkError::NoDestination)?;
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| SinkError::Publish("channel closed".into()))?;

        channel
            .basic_publish(
                "",
                destination,
                BasicPublishOptions::default(),
                message.as_bytes(),
                BasicProperties::default(),
            )
            .await
            .map_err(|e| SinkError::Publish(e.to_string()))?
            .await
            .map_err(|e| SinkError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        let mut first_err = None;

        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close(REPLY_SUCCESS, "OK").await {
                first_err.get_or_insert(SinkError::Close(e.to_string()));
            }
        }
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close(REPLY_SUCCESS, "OK").await {
                first_err.get_or_insert(SinkError::Close(e.to_string()));
            }
            log::debug!("Disconnected from RabbitMQ at {}", self.host);
        }
        self.destination = None;

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
