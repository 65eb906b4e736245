use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub plex: PlexConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    6690
}

/// How the session with the Plex server is established.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlexConnection {
    /// Connect straight to a server URL with a known token.
    Direct,
    /// Sign in to plex.tv and look the server up by name.
    Myplex,
}

/// Plex server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlexConfig {
    pub connection: PlexConnection,
    /// Server base URL (required for `direct`).
    #[serde(default)]
    pub url: Option<String>,
    /// Access token (required for `direct`).
    #[serde(default)]
    pub token: Option<String>,
    /// plex.tv account name (required for `myplex`).
    #[serde(default)]
    pub username: Option<String>,
    /// plex.tv account password (required for `myplex`).
    #[serde(default)]
    pub password: Option<String>,
    /// Server name as listed on the account (required for `myplex`).
    #[serde(default)]
    pub server: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Minimum delay between two requests to the server, 0 disables spacing.
    #[serde(default)]
    pub request_interval_ms: u64,
    /// Sign-in attempts before giving up (default: 20)
    #[serde(default = "default_login_attempts")]
    pub login_max_attempts: u32,
    /// Delay between sign-in attempts in seconds (default: 5)
    #[serde(default = "default_login_delay")]
    pub login_retry_delay_secs: u64,
}

impl PlexConfig {
    /// Config for a direct connection, used by tests and embedders.
    pub fn direct(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            connection: PlexConnection::Direct,
            url: Some(url.into()),
            token: Some(token.into()),
            username: None,
            password: None,
            server: None,
            timeout_secs: default_timeout(),
            request_interval_ms: 0,
            login_max_attempts: default_login_attempts(),
            login_retry_delay_secs: default_login_delay(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs as u64)
    }

    pub fn login_retry_delay(&self) -> Duration {
        Duration::from_secs(self.login_retry_delay_secs)
    }
}

fn default_timeout() -> u32 {
    30
}

fn default_login_attempts() -> u32 {
    20
}

fn default_login_delay() -> u64 {
    5
}

/// Query cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Lifetime of a memoized browse/search/lookup result (default: 3600).
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

/// Catalog index build configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Artists populated concurrently during the build (default: 1)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Section titles to index. Empty means every music section.
    #[serde(default)]
    pub sections: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            sections: Vec::new(),
        }
    }
}

fn default_workers() -> usize {
    1
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub plex: SanitizedPlexConfig,
    pub cache: CacheConfig,
    pub index: IndexConfig,
}

/// Sanitized Plex config (token and password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlexConfig {
    pub connection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    pub token_configured: bool,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let plex = &config.plex;
        Self {
            server: config.server.clone(),
            plex: SanitizedPlexConfig {
                connection: match plex.connection {
                    PlexConnection::Direct => "direct".to_string(),
                    PlexConnection::Myplex => "myplex".to_string(),
                },
                url: plex.url.clone(),
                username: plex.username.clone(),
                server: plex.server.clone(),
                token_configured: plex.token.as_deref().is_some_and(|t| !t.is_empty()),
                password_configured: plex.password.as_deref().is_some_and(|p| !p.is_empty()),
                timeout_secs: plex.timeout_secs,
            },
            cache: config.cache.clone(),
            index: config.index.clone(),
        }
    }
}
