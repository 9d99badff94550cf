//! Entry point for the Parking Engine binary.
//!
//! Running this binary will start an HTTP server that exposes a
//! minimal API for quoting exit fees, building PIX payloads and
//! computing revenue reports.  The settings JSON file may be
//! specified via the `PARKING_SETTINGS_FILE` environment variable; if
//! unset the server looks for a `settings.json` relative to the
//! current working directory.

use std::path::PathBuf;
use tracing::error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings_file =
        std::env::var("PARKING_SETTINGS_FILE").unwrap_or_else(|_| "settings.json".to_string());
    let addr = std::env::var("PARKING_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    if let Err(err) = parking_engine::api::serve(&addr, PathBuf::from(settings_file)).await {
        error!("error running server: {err}");
    }
}
