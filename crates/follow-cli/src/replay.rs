//! Offline replay of recorded detection events through the brain.
//!
//! Input is JSON lines, one event per line:
//!
//! ```text
//! {"t": 0.00, "found": true, "zone": "LEFT", "bbox": [12, 40, 90, 300], "conf": 0.91}
//! {"t": 0.05, "found": false}
//! ```
//!
//! `t` is seconds since the start of the recording.  `zone`, `bbox` and
//! `conf` may be omitted or `null`.  A zone tag the brain does not know is
//! read as "no zone", which the brain answers with `zone_error`.  Blank lines
//! are skipped.

use std::io::BufRead;
use std::time::Duration;

use follow_runtime::{Brain, Mode, Timestamp};
use follow_types::{DetectionEvent, MotionCommand, Rect, Zone};
use serde::Deserialize;
use tracing::warn;

/// One line of a recording as written by the detector logger.
#[derive(Debug, Deserialize)]
struct RecordedEvent {
    t: f64,
    found: bool,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    bbox: Option<[i32; 4]>,
    #[serde(default)]
    conf: f32,
}

impl RecordedEvent {
    fn into_event(self, line_no: usize) -> Result<(Timestamp, DetectionEvent), String> {
        let t = Duration::try_from_secs_f64(self.t)
            .map_err(|_| format!("line {line_no}: invalid timestamp {}", self.t))?;
        let zone = match self.zone.as_deref() {
            None => None,
            Some(tag) => match tag.parse::<Zone>() {
                Ok(z) => Some(z),
                Err(e) => {
                    warn!(line = line_no, error = %e, "unknown zone tag; treating as missing");
                    None
                }
            },
        };
        let event = DetectionEvent {
            found: self.found,
            zone,
            bbox: self.bbox.map(|[x1, y1, x2, y2]| Rect::new(x1, y1, x2, y2)),
            confidence: self.conf.clamp(0.0, 1.0),
        };
        Ok((t, event))
    }
}

/// Parse a whole recording.  Fails on the first malformed line, naming it.
pub fn read_events(reader: impl BufRead) -> Result<Vec<(Timestamp, DetectionEvent)>, String> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| format!("line {line_no}: read failed: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RecordedEvent = serde_json::from_str(&line)
            .map_err(|e| format!("line {line_no}: malformed event: {e}"))?;
        events.push(record.into_event(line_no)?);
    }
    Ok(events)
}

/// The brain's answer to one recorded event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub t: Timestamp,
    pub mode: Option<Mode>,
    pub command: MotionCommand,
}

/// Feed `events` through `brain` in order.
pub fn replay(brain: &mut Brain, events: &[(Timestamp, DetectionEvent)]) -> Vec<ReplayStep> {
    events
        .iter()
        .map(|(t, event)| {
            let command = brain.update(event, *t);
            ReplayStep {
                t: *t,
                mode: brain.mode(),
                command,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use follow_types::{BrainConfig, CommandLabel};
    use std::io::Cursor;

    fn labels(input: &str) -> Vec<CommandLabel> {
        let events = read_events(Cursor::new(input)).unwrap();
        let mut brain = Brain::new(BrainConfig::default());
        replay(&mut brain, &events)
            .into_iter()
            .map(|s| s.command.label)
            .collect()
    }

    #[test]
    fn recording_drives_follow_memory_search() {
        let input = r#"
{"t": 0.0, "found": true, "zone": "LEFT", "bbox": [10, 0, 60, 100], "conf": 0.9}
{"t": 0.3, "found": false}

{"t": 1.5, "found": false, "zone": null, "bbox": null}
"#;
        assert_eq!(
            labels(input),
            vec![
                CommandLabel::FollowLeft,
                CommandLabel::MemoryLeft,
                CommandLabel::SearchSpin
            ]
        );
    }

    #[test]
    fn unknown_zone_becomes_zone_error() {
        let input = r#"{"t": 0.0, "found": true, "zone": "UP", "conf": 0.8}"#;
        assert_eq!(labels(input), vec![CommandLabel::ZoneError]);
    }

    #[test]
    fn zone_tags_are_case_insensitive() {
        let input = r#"{"t": 0.0, "found": true, "zone": "center"}"#;
        assert_eq!(labels(input), vec![CommandLabel::FollowCenter]);
    }

    #[test]
    fn malformed_line_is_reported_with_its_number() {
        let input = "{\"t\": 0.0, \"found\": false}\nnot json\n";
        let err = read_events(Cursor::new(input)).unwrap_err();
        assert!(err.starts_with("line 2:"), "got: {err}");
    }

    #[test]
    fn negative_timestamp_is_rejected() {
        let input = r#"{"t": -1.0, "found": false}"#;
        let err = read_events(Cursor::new(input)).unwrap_err();
        assert!(err.contains("invalid timestamp"), "got: {err}");
    }

    #[test]
    fn replay_reports_mode_and_time() {
        let events = read_events(Cursor::new(r#"{"t": 0.25, "found": false}"#)).unwrap();
        let mut brain = Brain::new(BrainConfig::default());
        let steps = replay(&mut brain, &events);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].t, Duration::from_millis(250));
        assert_eq!(steps[0].mode, Some(Mode::Search));
    }

    #[test]
    fn recording_file_on_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"t": 0.0, "found": true, "zone": "RIGHT", "conf": 0.95}}"#).unwrap();
        writeln!(file, r#"{{"t": 0.1, "found": true, "zone": "RIGHT", "conf": 0.95}}"#).unwrap();

        let reader = std::io::BufReader::new(std::fs::File::open(file.path()).unwrap());
        let events = read_events(reader).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].0, Duration::from_millis(100));
        assert_eq!(events[1].1.zone, Some(Zone::Right));
    }
}
