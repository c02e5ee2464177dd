use chrono::Duration;
use heardle_core::{DEFAULT_MAX_PLAYERS, LobbyCleanup};
use heardle_persistence::connection::DEFAULT_DATABASE_URL;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("{name} must be at least 1")]
    MustBePositive { name: &'static str },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_players_per_lobby: u32,
    pub lobby_idle_timeout_minutes: u64,
    pub lobby_max_duration_minutes: u64,
    pub guess_burst: u32,
    pub guess_refill_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source; unset variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_players_per_lobby: parse_var(
                &lookup,
                "MAX_PLAYERS_PER_LOBBY",
                defaults.max_players_per_lobby,
            )?,
            lobby_idle_timeout_minutes: parse_var(
                &lookup,
                "LOBBY_IDLE_TIMEOUT_MINUTES",
                defaults.lobby_idle_timeout_minutes,
            )?,
            lobby_max_duration_minutes: parse_var(
                &lookup,
                "LOBBY_MAX_DURATION_MINUTES",
                defaults.lobby_max_duration_minutes,
            )?,
            guess_burst: parse_var(&lookup, "GUESS_BURST", defaults.guess_burst)?,
            guess_refill_seconds: parse_var(
                &lookup,
                "GUESS_REFILL_SECONDS",
                defaults.guess_refill_seconds,
            )?,
            cleanup_interval_seconds: parse_var(
                &lookup,
                "CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("MAX_PLAYERS_PER_LOBBY", self.max_players_per_lobby as u64),
            ("LOBBY_IDLE_TIMEOUT_MINUTES", self.lobby_idle_timeout_minutes),
            ("LOBBY_MAX_DURATION_MINUTES", self.lobby_max_duration_minutes),
            ("GUESS_BURST", self.guess_burst as u64),
            ("GUESS_REFILL_SECONDS", self.guess_refill_seconds),
            ("CLEANUP_INTERVAL_SECONDS", self.cleanup_interval_seconds),
        ];

        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigError::MustBePositive { name });
            }
        }

        let durations = [
            (
                "LOBBY_IDLE_TIMEOUT_MINUTES",
                self.lobby_idle_timeout_minutes,
                minutes(self.lobby_idle_timeout_minutes),
            ),
            (
                "LOBBY_MAX_DURATION_MINUTES",
                self.lobby_max_duration_minutes,
                minutes(self.lobby_max_duration_minutes),
            ),
            (
                "GUESS_REFILL_SECONDS",
                self.guess_refill_seconds,
                seconds(self.guess_refill_seconds),
            ),
        ];

        for (name, value, duration) in durations {
            if duration.is_none() {
                return Err(ConfigError::InvalidValue {
                    name,
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "HOST",
                value: self.host.clone(),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Out-of-range values (only reachable by building `Config` by hand) fall back to the defaults.
    pub fn lobby_cleanup(&self) -> LobbyCleanup {
        let defaults = LobbyCleanup::default();
        LobbyCleanup::new(
            minutes(self.lobby_idle_timeout_minutes).unwrap_or(defaults.idle_threshold),
            minutes(self.lobby_max_duration_minutes).unwrap_or(defaults.max_duration),
        )
    }

    pub fn guess_refill(&self) -> Duration {
        seconds(self.guess_refill_seconds).unwrap_or_else(|| Duration::seconds(2))
    }

    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_seconds)
    }
}

fn minutes(value: u64) -> Option<Duration> {
    i64::try_from(value).ok().and_then(Duration::try_minutes)
}

fn seconds(value: u64) -> Option<Duration> {
    i64::try_from(value).ok().and_then(Duration::try_seconds)
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_players_per_lobby: DEFAULT_MAX_PLAYERS,
            lobby_idle_timeout_minutes: 30,
            lobby_max_duration_minutes: 240,
            guess_burst: 10,
            guess_refill_seconds: 2,
            cleanup_interval_seconds: 30,
        }
    }
}
