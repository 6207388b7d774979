use std::fs;
use std::path::Path;

use tracing::debug;

use mandelscope_render::{InputEvent, ZoomDirection};

/// Read a JSON array of input events to replay.
pub(crate) fn load(path: &Path) -> Result<Vec<InputEvent>, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    let events: Vec<InputEvent> = serde_json::from_str(&json)?;
    debug!("Loaded {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Open a window-sized view, zoom twice toward the seahorse valley and nudge
/// it with a short drag.
pub(crate) fn default_script() -> Vec<InputEvent> {
    vec![
        InputEvent::Resize {
            width: 480,
            height: 320,
        },
        InputEvent::Zoom {
            x: 200.0,
            y: 130.0,
            direction: ZoomDirection::In,
        },
        InputEvent::Zoom {
            x: 200.0,
            y: 130.0,
            direction: ZoomDirection::In,
        },
        InputEvent::DragStart { x: 240.0, y: 160.0 },
        InputEvent::DragMove { x: 250.0, y: 165.0 },
        InputEvent::DragMove { x: 270.0, y: 170.0 },
        InputEvent::DragEnd { x: 280.0, y: 170.0 },
    ]
}
