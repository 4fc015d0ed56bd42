//! Structured trace output.
//!
//! All times are relative to the trace's base pair. Optional fields are
//! omitted from serialized output when absent; absence means "not
//! observed" and is distinct from zero.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::EventKind;

/// A structured execution trace reconstructed from one event window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphTrace {
    /// Wall-clock time represented as 0 in the trace, in microseconds
    /// since the Unix epoch.
    pub base_time: i64,
    /// Logical timestamp represented as 0 in the trace.
    pub base_timestamp: i64,
    pub node_traces: Vec<NodeTrace>,
    /// Interned stream names, indexed by stream id. Index 0 is the
    /// empty name reserved for "no stream".
    pub stream_names: Vec<String>,
}

impl GraphTrace {
    /// Serializes the trace as JSON, optionally pretty-printed.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if pretty {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }
}

/// One calculator invocation (aggregated mode) or one raw event
/// (verbatim mode).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTrace {
    pub node_id: i32,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_timestamp: Option<i64>,
    pub thread_id: i32,
    /// Earliest observed start, present only if a start-side event was
    /// seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Earliest observed finish, present only if a finish-side event
    /// was seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub inputs: Vec<StreamHop>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub outputs: Vec<StreamHop>,
}

/// One packet transfer across one stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamHop {
    /// Interned stream id; 0 means no stream.
    pub stream_id: u32,
    pub packet_timestamp: i64,
    /// When the producer emitted the packet, present only if the
    /// producing event was observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// When the consumer received the packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<i64>,
    /// Interned payload identity; 0 means no payload was recorded.
    #[serde(skip_serializing_if = "id_is_none", default)]
    pub packet_id: u32,
}

fn id_is_none(id: &u32) -> bool {
    *id == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_stay_absent_across_json() {
        let trace = GraphTrace {
            base_time: 100,
            base_timestamp: 0,
            node_traces: vec![NodeTrace {
                node_id: 1,
                kind: EventKind::Open,
                start_time: Some(0),
                ..NodeTrace::default()
            }],
            stream_names: vec![String::new()],
        };

        let json = trace.to_json(false).unwrap();
        assert!(!json.contains("finish_time"));
        assert!(!json.contains("input_timestamp"));

        let back: GraphTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);
        assert_eq!(back.node_traces[0].finish_time, None);
    }

    #[test]
    fn zero_valued_presence_is_preserved() {
        let record = NodeTrace {
            finish_time: Some(0),
            ..NodeTrace::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"finish_time\":0"));

        let back: NodeTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.finish_time, Some(0));
        assert_eq!(back.start_time, None);
    }

    #[test]
    fn unassigned_packet_id_is_omitted() {
        let hop = StreamHop {
            stream_id: 2,
            packet_timestamp: 5,
            finish_time: Some(9),
            ..StreamHop::default()
        };
        let json = serde_json::to_string(&hop).unwrap();
        assert!(!json.contains("packet_id"));

        let back: StreamHop = serde_json::from_str(&json).unwrap();
        assert_eq!(back.packet_id, 0);
    }
}
