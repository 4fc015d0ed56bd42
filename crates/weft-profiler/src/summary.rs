//! Aggregate views over a built trace.
//!
//! Condenses the per-invocation records of a [`GraphTrace`] into
//! per-node runtime totals and per-stream hop-latency totals. Only
//! records and hops with both endpoints observed contribute to the
//! latency figures; incomplete ones are counted but not timed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use weft_core::GraphTrace;

/// Per-node and per-stream aggregates for one trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Sorted by node id.
    pub nodes: Vec<NodeSummary>,
    /// Sorted by stream name.
    pub streams: Vec<StreamSummary>,
}

/// Invocation statistics for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub node_id: i32,
    /// Records observed for this node, complete or not.
    pub invocations: u64,
    /// Records with both a start and a finish.
    pub completed: u64,
    /// Total wall time of completed invocations, in microseconds.
    pub total_micros: i64,
    pub max_micros: i64,
}

impl NodeSummary {
    /// Mean wall time of completed invocations, in microseconds.
    pub fn mean_micros(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.total_micros as f64 / self.completed as f64
        }
    }
}

/// Hop-latency statistics for one stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub stream: String,
    /// Hops recorded on this stream.
    pub hops: u64,
    /// Hops where both the emit and the receipt were observed.
    pub correlated: u64,
    /// Total emit-to-receipt latency of correlated hops, microseconds.
    pub total_latency: i64,
    pub max_latency: i64,
}

impl StreamSummary {
    /// Mean emit-to-receipt latency of correlated hops, in microseconds.
    pub fn mean_latency(&self) -> f64 {
        if self.correlated == 0 {
            0.0
        } else {
            self.total_latency as f64 / self.correlated as f64
        }
    }
}

/// Condenses a trace into per-node and per-stream aggregates.
pub fn summarize(trace: &GraphTrace) -> TraceSummary {
    let mut nodes: BTreeMap<i32, NodeSummary> = BTreeMap::new();
    let mut streams: BTreeMap<String, StreamSummary> = BTreeMap::new();

    for record in &trace.node_traces {
        let node = nodes.entry(record.node_id).or_insert_with(|| NodeSummary {
            node_id: record.node_id,
            ..NodeSummary::default()
        });
        node.invocations += 1;
        if let (Some(start), Some(finish)) = (record.start_time, record.finish_time) {
            let duration = finish - start;
            node.completed += 1;
            node.total_micros += duration;
            node.max_micros = node.max_micros.max(duration);
        }

        for hop in record.inputs.iter().chain(&record.outputs) {
            // Id 0 is "no stream"; there is nothing to attribute.
            if hop.stream_id == 0 {
                continue;
            }
            let name = trace
                .stream_names
                .get(hop.stream_id as usize)
                .cloned()
                .unwrap_or_default();
            let stream = streams.entry(name.clone()).or_insert_with(|| StreamSummary {
                stream: name,
                ..StreamSummary::default()
            });
            stream.hops += 1;
            if let (Some(start), Some(finish)) = (hop.start_time, hop.finish_time) {
                let latency = finish - start;
                stream.correlated += 1;
                stream.total_latency += latency;
                stream.max_latency = stream.max_latency.max(latency);
            }
        }
    }

    TraceSummary {
        nodes: nodes.into_values().collect(),
        streams: streams.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{EventKind, NodeTrace, StreamHop};

    fn record(node_id: i32, start: Option<i64>, finish: Option<i64>) -> NodeTrace {
        NodeTrace {
            node_id,
            kind: EventKind::Process,
            start_time: start,
            finish_time: finish,
            ..NodeTrace::default()
        }
    }

    #[test]
    fn incomplete_invocations_count_but_do_not_time() {
        let trace = GraphTrace {
            node_traces: vec![
                record(1, Some(0), Some(30)),
                record(1, Some(40), Some(50)),
                record(1, Some(60), None),
                record(2, None, Some(5)),
            ],
            stream_names: vec![String::new()],
            ..GraphTrace::default()
        };

        let summary = summarize(&trace);
        assert_eq!(summary.nodes.len(), 2);

        let first = &summary.nodes[0];
        assert_eq!(first.node_id, 1);
        assert_eq!(first.invocations, 3);
        assert_eq!(first.completed, 2);
        assert_eq!(first.total_micros, 40);
        assert_eq!(first.max_micros, 30);
        assert!((first.mean_micros() - 20.0).abs() < f64::EPSILON);

        let second = &summary.nodes[1];
        assert_eq!(second.invocations, 1);
        assert_eq!(second.completed, 0);
        assert_eq!(second.mean_micros(), 0.0);
    }

    #[test]
    fn hop_latency_aggregates_per_stream() {
        let mut producer = record(1, Some(0), Some(2));
        producer.outputs.push(StreamHop {
            stream_id: 1,
            packet_timestamp: 0,
            finish_time: Some(2),
            ..StreamHop::default()
        });
        let mut consumer = record(2, Some(10), Some(20));
        consumer.outputs.push(StreamHop {
            stream_id: 1,
            packet_timestamp: 0,
            start_time: Some(2),
            finish_time: Some(20),
            ..StreamHop::default()
        });

        let trace = GraphTrace {
            node_traces: vec![producer, consumer],
            stream_names: vec![String::new(), "frames".to_string()],
            ..GraphTrace::default()
        };

        let summary = summarize(&trace);
        assert_eq!(summary.streams.len(), 1);
        let stream = &summary.streams[0];
        assert_eq!(stream.stream, "frames");
        assert_eq!(stream.hops, 2);
        assert_eq!(stream.correlated, 1);
        assert_eq!(stream.total_latency, 18);
        assert_eq!(stream.max_latency, 18);
        assert!((stream.mean_latency() - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hops_without_a_stream_are_ignored() {
        let mut lone = record(1, Some(0), Some(1));
        lone.inputs.push(StreamHop::default());

        let trace = GraphTrace {
            node_traces: vec![lone],
            stream_names: vec![String::new()],
            ..GraphTrace::default()
        };

        let summary = summarize(&trace);
        assert!(summary.streams.is_empty());
    }
}
