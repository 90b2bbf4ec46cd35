//! Serialization of drained events. Snapshots carry their own `to_json`.

use crate::events::GameEvent;

/// Serialize a batch of events, one JSON object per line.
pub fn events_to_json_lines(events: &[GameEvent]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(event)?);
        out.push('\n');
    }
    Ok(out)
}
