use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::sleep;

/// Get an available port for testing
pub fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to ephemeral port")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

/// A port nothing listens on (freshly released ephemeral port)
#[allow(dead_code)]
pub fn unreachable_port() -> u16 {
    get_available_port()
}

/// Build test URL for HTTP requests
#[allow(dead_code)]
pub fn get_test_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

/// Write a `.my.cnf` pointing at the given (unreachable) database target
#[allow(dead_code)]
pub fn write_test_config(db_port: u16) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp config");
    write!(
        file,
        "[client]\nuser = exporter\npassword = secret\nhost = 127.0.0.1\nport = {db_port}\n"
    )
    .expect("Failed to write temp config");
    file
}

/// Wait for server to be ready
#[allow(dead_code)]
pub async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    for _ in 0..max_attempts {
        if tokio::net::TcpStream::connect(format!("127.0.0.1:{port}"))
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(100)).await;
    }
    false
}
