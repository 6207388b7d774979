mod ascii;
mod script;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use mandelscope_render::{Action, Explorer, ExplorerConfig};

/// Upper bound on how long the host waits for the final frame.
const FRAME_TIMEOUT: Duration = Duration::from_secs(120);

/// Terminal cells used for the ASCII view.
const ASCII_COLS: u32 = 96;
const ASCII_ROWS: u32 = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Mandelscope");

    let mut args = std::env::args().skip(1);
    let config = match args.next().map(PathBuf::from) {
        Some(path) => ExplorerConfig::load(&path)?,
        None => ExplorerConfig::default(),
    };
    let events = match args.next().map(PathBuf::from) {
        Some(path) => script::load(&path)?,
        None => script::default_script(),
    };

    let mut explorer = Explorer::new(&config)?;
    for event in events {
        match explorer.handle(event) {
            Ok(Action::Render) => {
                info!(version = explorer.current_version(), ?event, "Render requested")
            }
            Ok(_) => {}
            Err(e) => warn!(?event, error = %e, "Event rejected"),
        }
        // Pick up whatever finished in between, like a UI event loop would.
        if let Some(ready) = explorer.poll() {
            info!(version = ready.version, "Frame ready during replay");
        }
    }

    match explorer.wait_for_frame(FRAME_TIMEOUT) {
        Some(ready) => info!(
            version = ready.version,
            size = %ready.size,
            viewport = %ready.viewport,
            elapsed_ms = ready.elapsed.as_millis(),
            "Final frame"
        ),
        None => warn!(phase = explorer.phase().label(), "No new frame completed"),
    }

    let art = ascii::render(&explorer, ASCII_COLS, ASCII_ROWS)?;
    println!("{art}");
    Ok(())
}
