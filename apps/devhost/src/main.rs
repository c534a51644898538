use devhost::backend::DemoBackend;
use devhost::error::HostError;
use devhost::logger::initialize as LoggerInitialize;

use bridge_core::transport::ChannelTransport;
use bridge_core::{Bridge, DEFAULT_CHANNEL_CAPACITY};

use common::ErrorLocation;

use std::env::temp_dir;
use std::fs::create_dir_all;
use std::panic::Location;
use std::sync::Arc;

use log::info;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let log_dir = temp_dir().join("devhost");
    create_dir_all(&log_dir).map_err(|e| HostError::Host {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    LoggerInitialize(&log_dir)?;

    info!("Development host starting");
    info!("Log directory: {}", log_dir.display());

    // Wire a bridge to the in-process demo backend over a channel
    let (transport, inbox) = ChannelTransport::pair(DEFAULT_CHANNEL_CAPACITY);
    let bridge = Bridge::new(Arc::new(transport));
    let backend = DemoBackend::new(inbox, bridge.router());
    let backend_task = tokio::spawn(backend.run());

    // One-shot round trip
    let greeting = bridge.one_shot(json!({ "who": "devhost" })).await?;
    info!("One-shot reply: {greeting}");

    // Paginated listing, three items at a time
    let handle = bridge.initiate(json!({ "pattern": "*.txt" })).await?;
    info!("Listing opened: {handle}");

    loop {
        let page = bridge.fetch_page(&handle, 3).await?;
        for item in &page.items {
            info!("  entry: {item}");
        }
        if page.done {
            break;
        }
    }

    bridge.release(&handle).await?;
    info!("Listing exhausted and released");

    drop(bridge);
    backend_task.await.map_err(|e| HostError::Host {
        message: format!("Demo backend task failed: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    Ok(())
}
