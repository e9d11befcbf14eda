//! # Connections Module
//!
//! Broker sinks behind the `core::sink::BrokerSink` interface, and the
//! factory the binary uses to pick one from the configuration.

use crate::core::sink::{BrokerConfig, BrokerKind, BrokerSink, SinkError};

/// RabbitMQ sink over AMQP 0.9.1.
pub mod amqp;

/// Redis list sink.
pub mod mq_redis;

pub use amqp::AmqpSink;
pub use mq_redis::RedisSink;

/// # Connect Sink
///
/// Opens the broker selected by `config.kind` and declares the configured
/// queue. A sink that connected but could not declare is closed before the
/// error is returned.
///
/// # Errors
/// Returns `SinkError::Connect` or `SinkError::Declare`.
pub async fn connect_sink(config: &BrokerConfig) -> Result<Box<dyn BrokerSink>, SinkError> {
    let mut sink: Box<dyn BrokerSink> = match config.kind {
        BrokerKind::Amqp => Box::new(AmqpSink::connect(config).await?),
        BrokerKind::Redis => Box::new(RedisSink::connect(config).await?),
    };

    if let Err(e) = sink.ensure_destination(&config.queue).await {
        if let Err(close_err) = sink.close().await {
            log::warn!("{}", close_err);
        }
        return Err(e);
    }

    log::info!("Publishing to {:?} queue {:?} on {}", config.kind, config.queue, config.host);
    Ok(sink)
}
