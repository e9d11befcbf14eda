//! # Pipeline Configuration
//!
//! Command line flags (each also readable from a `STREAM_*` environment
//! variable) and their conversion into `PipelineConfig`. The camelCase
//! aliases accept the spelling used by older launch scripts
//! (`--dataFile`, `--mqHost`, ...).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::core::coordinator::PipelineSettings;
use crate::core::sink::{BrokerConfig, BrokerKind, Credentials};

/// Invalid combinations that clap cannot express on its own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A user was given without a password.
    #[error("--mq-password is required when --mq-user is given")]
    MissingPassword,

    /// A required flag holds only whitespace.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Broker protocol selected on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MqKind {
    /// RabbitMQ (AMQP 0.9.1).
    #[default]
    Amqp,
    /// Redis list.
    Redis,
}

impl From<MqKind> for BrokerKind {
    fn from(kind: MqKind) -> Self {
        match kind {
            MqKind::Amqp => BrokerKind::Amqp,
            MqKind::Redis => BrokerKind::Redis,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "stream_utility",
    about = "Resolves entity references from a file and publishes affected-entity notifications.",
    version,
    long_about = None
)]
/// Command line flags of `stream_utility`.
pub struct CliArgs {
    /// Input file.
    #[clap(long = "data-file", alias = "dataFile", env = "STREAM_DATA_FILE", help = "Path to the source file.")]
    pub data_file: PathBuf,

    /// Resolver INI file.
    #[clap(long = "ini-file", alias = "iniFile", env = "STREAM_INI_FILE", help = "Path to the resolver INI file.")]
    pub ini_file: PathBuf,

    /// Broker host.
    #[clap(long = "mq-host", alias = "mqHost", env = "STREAM_MQ_HOST", help = "Host (and optional port) of the message broker.")]
    pub mq_host: String,

    /// Destination queue.
    #[clap(long = "mq-queue", alias = "mqQueue", env = "STREAM_MQ_QUEUE", help = "Name of the queue receiving the messages.")]
    pub mq_queue: String,

    /// Broker user.
    #[clap(long = "mq-user", alias = "mqUser", env = "STREAM_MQ_USER", requires = "mq_password", help = "User name for the broker.")]
    pub mq_user: Option<String>,

    /// Broker password.
    #[clap(long = "mq-password", alias = "mqPassword", env = "STREAM_MQ_PASSWORD", help = "Password for the broker.")]
    pub mq_password: Option<String>,

    /// Broker protocol.
    #[clap(long = "mq-kind", env = "STREAM_MQ_KIND", value_enum, default_value_t = MqKind::Amqp, help = "Broker protocol.")]
    pub mq_kind: MqKind,

    /// Channel capacity.
    #[clap(
        long = "channel-capacity",
        env = "STREAM_CHANNEL_CAPACITY",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Messages buffered between the file reader and the publisher."
    )]
    pub channel_capacity: u32,

    /// Progress interval.
    #[clap(long = "progress-interval", env = "STREAM_PROGRESS_INTERVAL", default_value_t = 1000, help = "Published messages between progress lines (0 disables).")]
    pub progress_interval: u64,

    /// Logging level.
    #[clap(long = "log-level", env = "STREAM_LOG_LEVEL", default_value = "info", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: String,

    /// Log directory.
    #[clap(long = "log-dir", env = "STREAM_LOG_DIR", help = "Directory for log files; console only when omitted.")]
    pub log_dir: Option<PathBuf>,
}

/// # Pipeline Configuration
///
/// Everything a run needs, fixed before anything starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Input file.
    pub data_file: PathBuf,
    /// Resolver INI file.
    pub ini_file: PathBuf,
    /// Broker connection settings.
    pub broker: BrokerConfig,
    /// Channel and progress tunables.
    pub settings: PipelineSettings,
    /// Logging level name.
    pub log_level: String,
    /// Optional log directory.
    pub log_dir: Option<PathBuf>,
}

impl TryFrom<CliArgs> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.mq_host.trim().is_empty() {
            return Err(ConfigError::Empty("--mq-host"));
        }
        if args.mq_queue.trim().is_empty() {
            return Err(ConfigError::Empty("--mq-queue"));
        }

        // An empty user means "use the broker's default account".
        let credentials = match (args.mq_user.filter(|u| !u.is_empty()), args.mq_password) {
            (Some(user), Some(password)) => Some(Credentials { user, password }),
            (Some(_), None) => return Err(ConfigError::MissingPassword),
            (None, _) => None,
        };

        Ok(Self {
            data_file: args.data_file,
            ini_file: args.ini_file,
            broker: BrokerConfig {
                host: args.mq_host,
                queue: args.mq_queue,
                credentials,
                kind: args.mq_kind.into(),
            },
            settings: PipelineSettings {
                channel_capacity: args.channel_capacity as usize,
                progress_interval: args.progress_interval,
            },
            log_level: args.log_level,
            log_dir: args.log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 9] = [
        "stream_utility",
        "--data-file",
        "refs.csv",
        "--ini-file",
        "resolver.ini",
        "--mq-host",
        "localhost",
        "--mq-queue",
        "affected",
    ];

    fn parse(extra: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(REQUIRED.iter().chain(extra.iter()))
    }

    #[test]
    fn test_required_flags_build_a_config() {
        let config = PipelineConfig::try_from(parse(&[]).unwrap()).unwrap();

        assert_eq!(config.data_file, PathBuf::from("refs.csv"));
        assert_eq!(config.ini_file, PathBuf::from("resolver.ini"));
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.queue, "affected");
        assert_eq!(config.broker.credentials, None);
        assert_eq!(config.broker.kind, BrokerKind::Amqp);
        assert_eq!(config.settings, PipelineSettings::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_required_flag_is_a_usage_error() {
        let err = CliArgs::try_parse_from(["stream_utility", "--data-file", "refs.csv"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_user_requires_password() {
        let err = parse(&["--mq-user", "loader"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let config = PipelineConfig::try_from(parse(&["--mq-user", "loader", "--mq-password", "pw"]).unwrap()).unwrap();
        assert_eq!(
            config.broker.credentials,
            Some(Credentials { user: "loader".into(), password: "pw".into() })
        );
    }

    #[test]
    fn test_camel_case_aliases_are_accepted() {
        let args = CliArgs::try_parse_from([
            "stream_utility",
            "--dataFile",
            "a.csv",
            "--iniFile",
            "g2.ini",
            "--mqHost",
            "rabbit:5672",
            "--mqQueue",
            "q",
        ])
        .unwrap();
        assert_eq!(args.mq_host, "rabbit:5672");
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(parse(&["--channel-capacity", "0"]).is_err());
        let config = PipelineConfig::try_from(parse(&["--channel-capacity", "1", "--mq-kind", "redis"]).unwrap()).unwrap();
        assert_eq!(config.settings.channel_capacity, 1);
        assert_eq!(config.broker.kind, BrokerKind::Redis);
    }

    #[test]
    fn test_blank_queue_is_rejected() {
        let args = CliArgs::try_parse_from([
            "stream_utility", "--data-file", "a", "--ini-file", "b", "--mq-host", "h", "--mq-queue", " ",
        ])
        .unwrap();
        assert_eq!(PipelineConfig::try_from(args), Err(ConfigError::Empty("--mq-queue")));
    }
}
