use color_eyre::eyre::{Result, WrapErr};
use log::info;
use std::path::Path;

use crate::model::snapshot::SnapshotEvent;
use crate::util::write_atomically;

/// Writes the event snapshot as a pretty printed JSON list
pub fn write_snapshot(events: &[SnapshotEvent], file_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(events).wrap_err("could not serialize snapshot")?;
    info!("writing {} events to {:?}", events.len(), file_path);
    write_atomically(file_path, json.as_bytes())
        .wrap_err("could not write event snapshot file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::feed_source::decode_snapshot;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn snapshot_can_be_read_back() {
        let dir = std::env::temp_dir().join(format!("signboard-snapshot-{}", std::process::id()));
        let path = dir.join("data").join("events.json");
        let events = vec![
            SnapshotEvent {
                title: "Parade".into(),
                start: Some("2026-07-04T15:00:00Z".into()),
                time: Some("10:00 AM".into()),
                location: "Main St".into(),
                link: Some("https://example.com/parade".into()),
                ..SnapshotEvent::default()
            },
            SnapshotEvent {
                title: "Someday".into(),
                ..SnapshotEvent::default()
            },
        ];

        write_snapshot(&events, &path).unwrap();
        let read_back = decode_snapshot(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read_back, events);

        fs::remove_dir_all(&dir).unwrap();
    }
}
