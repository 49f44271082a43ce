//! Shared fixtures for app integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reclink_app::{ClientConfig, RecorderClient};
use reclink_gateway::SyntheticGateway;
use reclink_session::SessionEvent;

/// Config with a short poll interval so poll-mode tests stay fast.
#[allow(dead_code)]
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        poll_interval: Duration::from_millis(100),
        push_enabled: true,
    }
}

/// Connects a client to `gateway`.
#[allow(dead_code)]
pub async fn connect(gateway: &Arc<SyntheticGateway>) -> RecorderClient {
    RecorderClient::connect(gateway.clone(), fast_config()).await
}

/// Records every completed output path announced by `client`.
#[allow(dead_code)]
pub fn completions(client: &RecorderClient) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.subscribe(move |event| {
        if let SessionEvent::RecordingCompleted { output_path } = event {
            sink.lock().expect("completions").push(output_path.clone());
        }
    });
    seen
}

/// Fresh scratch directory unique to this process and `name`.
#[allow(dead_code)]
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reclink-app-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}
