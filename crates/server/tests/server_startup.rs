use std::io::Write;
use std::net::TcpListener;
use std::process::ExitStatus;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::time::timeout;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Run the server binary to completion with the given config path.
async fn run_server(config_path: &std::path::Path) -> ExitStatus {
    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_plexdex"))
        .env("PLEXDEX_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server");

    timeout(Duration::from_secs(30), child.wait())
        .await
        .expect("Server did not exit in time")
        .expect("Failed to wait for server")
}

#[tokio::test]
async fn test_missing_config_exits_with_error() {
    let status = run_server(std::path::Path::new("/nonexistent/plexdex.toml")).await;
    assert_eq!(status.code(), Some(1));
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[plex]\nconnection = \"direct\"\n")
        .unwrap();
    temp_file.flush().unwrap();

    let status = run_server(temp_file.path()).await;
    assert_eq!(status.code(), Some(1));
}

#[tokio::test]
async fn test_unreachable_plex_server_is_fatal() {
    // nothing listens on this port once the probe socket is dropped
    let plex_port = get_available_port();
    let config = format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[plex]
connection = "direct"
url = "http://127.0.0.1:{}"
token = "unused"
timeout_secs = 2
"#,
        get_available_port(),
        plex_port
    );

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let status = run_server(temp_file.path()).await;
    assert_eq!(status.code(), Some(1));
}
