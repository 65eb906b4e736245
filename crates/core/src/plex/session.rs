//! Session establishment.
//!
//! `direct` connections use the configured URL and token as-is. `myplex`
//! connections sign in to plex.tv (retrying a bounded number of times),
//! then look the named server up among the account's resources.

use reqwest::Client;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use super::http::client_headers;
use super::{PlexError, PlexHttpClient};
use crate::config::{PlexConfig, PlexConnection};

const PLEX_TV_URL: &str = "https://plex.tv";

/// Connect to the configured server.
pub async fn connect(config: &PlexConfig) -> Result<PlexHttpClient, PlexError> {
    let client_id = Uuid::new_v4().to_string();

    match config.connection {
        PlexConnection::Direct => {
            let url = required(&config.url, "url")?;
            let token = required(&config.token, "token")?;
            info!("Connecting to Plex server: {}", url);
            PlexHttpClient::new(url, token, &client_id, config)
        }
        PlexConnection::Myplex => {
            let username = required(&config.username, "username")?;
            let password = required(&config.password, "password")?;
            let server_name = required(&config.server, "server")?;

            let http = Client::builder()
                .default_headers(client_headers(&client_id)?)
                .timeout(config.timeout())
                .build()?;

            let account_token = sign_in(&http, username, password, config).await?;
            let resources = list_resources(&http, &account_token).await?;
            let (url, token) = pick_connection(&resources, server_name, &account_token)?;

            info!("Connecting to Plex server: {} ({})", server_name, url);
            PlexHttpClient::new(&url, &token, &client_id, config)
        }
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, PlexError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PlexError::Login(format!("plex.{} is not configured", field)))
}

/// Sign in to plex.tv, retrying with a fixed delay.
async fn sign_in(
    http: &Client,
    username: &str,
    password: &str,
    config: &PlexConfig,
) -> Result<String, PlexError> {
    let max_attempts = config.login_max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match try_sign_in(http, username, password).await {
            Ok(token) => return Ok(token),
            Err(e) if attempt >= max_attempts => {
                error!("Could not sign in to plex.tv in time, giving up: {}", e);
                return Err(PlexError::Login(format!(
                    "gave up after {} attempts: {}",
                    attempt, e
                )));
            }
            Err(e) => {
                error!(
                    "Failed to sign in to plex.tv, retrying... {}/{}: {}",
                    attempt, max_attempts, e
                );
                sleep(config.login_retry_delay()).await;
            }
        }
    }
}

async fn try_sign_in(http: &Client, username: &str, password: &str) -> Result<String, PlexError> {
    let response = http
        .post(format!("{}/users/sign_in.json", PLEX_TV_URL))
        .basic_auth(username, Some(password))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PlexError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    let sign_in: SignInResponse = response
        .json()
        .await
        .map_err(|e| PlexError::Parse(format!("Failed to parse sign-in response: {}", e)))?;

    Ok(sign_in.user.auth_token)
}

async fn list_resources(http: &Client, token: &str) -> Result<Vec<Resource>, PlexError> {
    let response = http
        .get(format!("{}/api/v2/resources", PLEX_TV_URL))
        .query(&[("includeHttps", "1")])
        .header("X-Plex-Token", token)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PlexError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| PlexError::Parse(format!("Failed to parse resources: {}", e)))
}

/// Choose the base URL and token for the named server.
///
/// Connections are made over plain HTTP to the advertised address, the
/// first advertised connection wins. The server's own access token is
/// preferred over the account token.
fn pick_connection(
    resources: &[Resource],
    server_name: &str,
    account_token: &str,
) -> Result<(String, String), PlexError> {
    let resource = resources
        .iter()
        .find(|r| r.name == server_name && r.provides.split(',').any(|p| p == "server"))
        .ok_or_else(|| PlexError::ServerNotFound(server_name.to_string()))?;

    let connection = resource
        .connections
        .first()
        .ok_or_else(|| PlexError::ServerNotFound(format!("{} has no connections", server_name)))?;

    let url = format!("http://{}:{}", connection.address, connection.port);
    let token = resource
        .access_token
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| account_token.to_string());

    Ok((url, token))
}

// ============================================================================
// plex.tv Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SignInResponse {
    user: SignInUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInUser {
    auth_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resource {
    name: String,
    #[serde(default)]
    provides: String,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    connections: Vec<ResourceConnection>,
}

#[derive(Debug, Deserialize)]
struct ResourceConnection {
    address: String,
    port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> Vec<Resource> {
        serde_json::from_str(
            r#"[
                {"name": "Phone", "provides": "client,player", "connections": []},
                {"name": "Den", "provides": "server", "accessToken": "server-token",
                 "connections": [
                    {"address": "192.168.1.20", "port": 32400, "uri": "https://192-168-1-20.x.plex.direct:32400"},
                    {"address": "10.0.0.5", "port": 32400}
                 ]},
                {"name": "Attic", "provides": "server", "connections": [
                    {"address": "192.168.1.30", "port": 32401}
                 ]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_pick_connection_uses_first_connection_and_server_token() {
        let (url, token) = pick_connection(&resources(), "Den", "account-token").unwrap();
        assert_eq!(url, "http://192.168.1.20:32400");
        assert_eq!(token, "server-token");
    }

    #[test]
    fn test_pick_connection_falls_back_to_account_token() {
        let (url, token) = pick_connection(&resources(), "Attic", "account-token").unwrap();
        assert_eq!(url, "http://192.168.1.30:32401");
        assert_eq!(token, "account-token");
    }

    #[test]
    fn test_pick_connection_ignores_non_servers() {
        let err = pick_connection(&resources(), "Phone", "t").unwrap_err();
        assert!(matches!(err, PlexError::ServerNotFound(_)));

        let err = pick_connection(&resources(), "Garage", "t").unwrap_err();
        assert!(matches!(err, PlexError::ServerNotFound(_)));
    }

    #[test]
    fn test_sign_in_response_parsing() {
        let parsed: SignInResponse =
            serde_json::from_str(r#"{"user": {"id": 1, "authToken": "abc123"}}"#).unwrap();
        assert_eq!(parsed.user.auth_token, "abc123");
    }

    #[tokio::test]
    async fn test_connect_direct_requires_token() {
        let mut config = PlexConfig::direct("http://localhost:32400", "");
        config.token = None;
        let result = connect(&config).await;
        assert!(matches!(result, Err(PlexError::Login(_))));
    }

    #[tokio::test]
    async fn test_connect_direct() {
        let config = PlexConfig::direct("http://localhost:32400", "tok");
        let client = connect(&config).await.unwrap();
        assert_eq!(client.base_url(), "http://localhost:32400");
    }
}
