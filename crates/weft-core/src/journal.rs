//! JSON Lines event journals.
//!
//! A journal is the on-disk form of an event buffer: one serialized
//! [`TraceEvent`] per line, in append order. Blank lines are skipped so
//! journals can be concatenated.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};
use crate::event::TraceEvent;

/// Reads every event from a JSON Lines journal.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line)
            .map_err(|e| Error::InvalidEvent(format!("journal line {}: {}", number + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

/// Writes events as a JSON Lines journal.
pub fn write_events<W: Write>(mut writer: W, events: &[TraceEvent]) -> Result<()> {
    for event in events {
        let line = serde_json::to_string(event)?;
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, PacketDataId};
    use crate::time::{LogicalTime, WallTime};
    use std::sync::Arc;

    fn sample() -> Vec<TraceEvent> {
        vec![
            TraceEvent::new(EventKind::Open)
                .with_node(1)
                .with_input_ts(LogicalTime::new(0))
                .at(WallTime::from_micros(100)),
            TraceEvent::new(EventKind::Process)
                .with_node(2)
                .with_stream(Arc::from("frames"))
                .with_finish(true)
                .with_input_ts(LogicalTime::new(10))
                .with_packet_ts(LogicalTime::new(10))
                .at(WallTime::from_micros(250))
                .with_packet(PacketDataId(42)),
        ]
    }

    #[test]
    fn round_trips_events_line_by_line() {
        let events = sample();
        let mut bytes = Vec::new();
        write_events(&mut bytes, &events).unwrap();
        assert_eq!(bytes.iter().filter(|&&b| b == b'\n').count(), 2);

        let back = read_events(bytes.as_slice()).unwrap();
        assert_eq!(back, events);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let events = sample();
        let mut bytes = Vec::new();
        write_events(&mut bytes, &events[..1]).unwrap();
        bytes.extend_from_slice(b"\n  \n");
        write_events(&mut bytes, &events[1..]).unwrap();

        let back = read_events(bytes.as_slice()).unwrap();
        assert_eq!(back, events);
    }

    #[test]
    fn malformed_lines_report_their_line_number() {
        let err = read_events("{\"bad\": true}\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidEvent(_)));
        assert!(err.to_string().contains("journal line 1"));
    }
}
