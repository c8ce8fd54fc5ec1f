//! Server configuration from command-line flags and environment variables.
//!
//! Flags take precedence over the environment. The repository is chosen in
//! this order: a `--config` TOML file, then Postgres when a DSN is given,
//! otherwise the in-memory store.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::db::{FeedRepository, PostgresConfig, RepositoryFactory, RepositoryResult, RepositoryType};

/// Deployment environment reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            _ => Err(format!("unknown environment: {}", s)),
        }
    }
}

/// Command-line interface of the feeds server.
#[derive(Debug, Clone, Parser)]
#[command(name = "rss-feeds-server", version, about = "RSS feed metadata API")]
pub struct Cli {
    /// Environment (development|production)
    #[arg(long, env = "RSSAPP_ENV", default_value = "development")]
    pub env: String,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// API server port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// PostgreSQL DSN
    #[arg(long = "db-dsn", env = "RSSAPP_DB_DSN")]
    pub db_dsn: Option<String>,

    /// PostgreSQL max open connections
    #[arg(long = "db-max-open-conns", default_value_t = 25)]
    pub db_max_open_conns: u32,

    /// PostgreSQL max idle connections
    #[arg(long = "db-max-idle-conns", default_value_t = 25)]
    pub db_max_idle_conns: u32,

    /// PostgreSQL max connection idle time (e.g. 30s, 15m, 1h)
    #[arg(long = "db-max-idle-time", default_value = "15m", value_parser = parse_duration)]
    pub db_max_idle_time: Duration,

    /// Repository configuration file (TOML)
    #[arg(long, env = "REPOSITORY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Where the repository comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RepositorySource {
    Local,
    Postgres(PostgresConfig),
    File(PathBuf),
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub host: String,
    pub port: u16,
    pub repository: RepositorySource,
}

impl Cli {
    /// Resolve flags into an [`AppConfig`]. An unknown environment falls back
    /// to development with a warning.
    pub fn into_config(self) -> AppConfig {
        let env = match self.env.parse::<Environment>() {
            Ok(env) => env,
            Err(_) => {
                warn!(
                    env = %self.env,
                    "invalid environment, using development"
                );
                Environment::Development
            }
        };

        let repository = match (self.config, self.db_dsn) {
            (Some(path), _) => RepositorySource::File(path),
            (None, Some(dsn)) if !dsn.is_empty() => RepositorySource::Postgres(PostgresConfig {
                database_url: dsn,
                max_pool_size: self.db_max_open_conns,
                min_idle: self.db_max_idle_conns,
                idle_timeout_sec: self.db_max_idle_time.as_secs(),
                ..PostgresConfig::default()
            }),
            _ => RepositorySource::Local,
        };

        AppConfig {
            env,
            host: self.host,
            port: self.port,
            repository,
        }
    }
}

impl AppConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the configured repository.
    pub async fn build_repository(&self) -> RepositoryResult<Arc<dyn FeedRepository>> {
        match &self.repository {
            RepositorySource::File(path) => {
                info!(path = %path.display(), "loading repository configuration");
                RepositoryFactory::from_config_file(path).await
            }
            RepositorySource::Postgres(config) => {
                info!(
                    max_pool_size = config.max_pool_size,
                    min_idle = config.min_idle,
                    "using postgres repository"
                );
                RepositoryFactory::create(RepositoryType::Postgres, Some(config)).await
            }
            RepositorySource::Local => {
                info!("using in-memory repository");
                RepositoryFactory::create(RepositoryType::Local, None).await
            }
        }
    }
}

/// Parse durations such as `500ms`, `30s`, `15m`, `1h`. A bare number is
/// seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration: {:?}", s))?;

    let seconds_per_unit = match unit {
        "ms" => return Ok(Duration::from_millis(value)),
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => return Err(format!("invalid duration unit in {:?}", s)),
    };
    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration out of range: {:?}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let mut argv = vec!["rss-feeds-server"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv).into_config()
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["rss-feeds-server", "--env", "development"]);
        assert_eq!(cli.db_max_open_conns, 25);
        assert_eq!(cli.db_max_idle_conns, 25);
        assert_eq!(cli.db_max_idle_time, Duration::from_secs(15 * 60));
        assert_eq!(cli.into_config().env, Environment::Development);
    }

    #[test]
    fn test_production_env() {
        let config = parse(&["--env", "production", "--host", "0.0.0.0", "--port", "4000"]);
        assert_eq!(config.env, Environment::Production);
        assert_eq!(config.port, 4000);
        assert_eq!(config.socket_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn test_invalid_env_falls_back_to_development() {
        let config = parse(&["--env", "staging"]);
        assert_eq!(config.env, Environment::Development);
    }

    #[test]
    fn test_dsn_selects_postgres() {
        let config = parse(&[
            "--db-dsn",
            "postgres://rss@localhost/rss",
            "--db-max-open-conns",
            "10",
            "--db-max-idle-conns",
            "4",
            "--db-max-idle-time",
            "5m",
        ]);
        match config.repository {
            RepositorySource::Postgres(pg) => {
                assert_eq!(pg.database_url, "postgres://rss@localhost/rss");
                assert_eq!(pg.max_pool_size, 10);
                assert_eq!(pg.min_idle, 4);
                assert_eq!(pg.idle_timeout_sec, 300);
            }
            other => panic!("expected postgres, got {:?}", other),
        }
    }

    #[test]
    fn test_config_file_wins_over_dsn() {
        let config = parse(&[
            "--db-dsn",
            "postgres://rss@localhost/rss",
            "--config",
            "repository.toml",
        ]);
        assert_eq!(
            config.repository,
            RepositorySource::File(PathBuf::from("repository.toml"))
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("10d").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        let huge = format!("{}h", u64::MAX / 60);
        assert!(parse_duration(&huge).is_err());
        assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
        assert_eq!(
            parse_duration(&format!("{}s", u64::MAX)).unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[cfg(feature = "local-repo")]
    #[tokio::test]
    async fn test_build_local_repository() {
        let config = AppConfig {
            env: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 0,
            repository: RepositorySource::Local,
        };
        let repo = config.build_repository().await.unwrap();
        assert!(repo.health_check().await.unwrap());
    }
}
