use super::{types::Config, ConfigError, PlexConnection};

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Connection-specific Plex fields are present
/// - Cache TTL, index workers and login attempts are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let plex = &config.plex;
    match plex.connection {
        PlexConnection::Direct => {
            if is_blank(&plex.url) {
                return Err(ConfigError::ValidationError(
                    "plex.url is required for direct connections".to_string(),
                ));
            }
            if is_blank(&plex.token) {
                return Err(ConfigError::ValidationError(
                    "plex.token is required for direct connections".to_string(),
                ));
            }
        }
        PlexConnection::Myplex => {
            for (field, value) in [
                ("username", &plex.username),
                ("password", &plex.password),
                ("server", &plex.server),
            ] {
                if is_blank(value) {
                    return Err(ConfigError::ValidationError(format!(
                        "plex.{} is required for myplex connections",
                        field
                    )));
                }
            }
            if plex.login_max_attempts == 0 {
                return Err(ConfigError::ValidationError(
                    "plex.login_max_attempts cannot be 0".to_string(),
                ));
            }
        }
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs cannot be 0".to_string(),
        ));
    }

    if config.index.workers == 0 {
        return Err(ConfigError::ValidationError(
            "index.workers cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, IndexConfig, PlexConfig, ServerConfig};
    use std::net::IpAddr;

    fn direct_config() -> Config {
        Config {
            plex: PlexConfig::direct("http://localhost:32400", "token"),
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            index: IndexConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&direct_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = direct_config();
        config.server = ServerConfig {
            host: "0.0.0.0".parse::<IpAddr>().unwrap(),
            port: 0,
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_direct_without_token_fails() {
        let mut config = direct_config();
        config.plex.token = Some("  ".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("plex.token"));
    }

    #[test]
    fn test_validate_myplex_requires_server_name() {
        let mut config = direct_config();
        config.plex.connection = PlexConnection::Myplex;
        config.plex.username = Some("listener".to_string());
        config.plex.password = Some("pw".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("plex.server"));

        config.plex.server = Some("Den".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_ttl_and_workers_fail() {
        let mut config = direct_config();
        config.cache.ttl_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = direct_config();
        config.index.workers = 0;
        assert!(validate_config(&config).is_err());
    }
}
