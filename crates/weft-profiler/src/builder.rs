//! Reconstruction of structured traces from event windows.
//!
//! [`TraceBuilder`] correlates the interleaved, multi-threaded events
//! of one graph run. Events carrying packet detail are grouped by
//! invocation identity (node, input timestamp, kind), and packet hops
//! are matched to their producing event by (stream, packet timestamp,
//! kind), so a consumer-side record can report when its input was
//! actually emitted and on which thread.
//!
//! A builder instance is meant to live as long as the graph run: the
//! first window it processes fixes the wall-clock and logical zero
//! points for every later trace, and the invocation and producer
//! indices persist across windows so a hop can resolve a producer that
//! fell in an earlier window. The indices grow without bound until
//! [`TraceBuilder::reset`]; deciding when to reset is the caller's
//! policy.

use std::collections::{HashMap, HashSet};

use weft_core::{EventKind, GraphTrace, LogicalTime, NodeTrace, StreamHop, TraceEvent, WallTime};

use crate::buffer::EventBuffer;
use crate::intern::{PacketIdIndex, StreamNameIndex};

/// Identity of one calculator invocation's start or finish moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InvocationKey {
    node_id: i32,
    input_ts: LogicalTime,
    kind: EventKind,
}

impl InvocationKey {
    fn of(event: &TraceEvent) -> Self {
        Self {
            node_id: event.node_id,
            input_ts: event.input_ts,
            kind: event.kind,
        }
    }
}

/// Identity of one directed packet hop over one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HopKey {
    stream_id: u32,
    packet_ts: LogicalTime,
    kind: EventKind,
}

/// The zero points all output times are measured against.
#[derive(Debug, Clone, Copy)]
struct TraceBase {
    time: i64,
    timestamp: i64,
}

impl TraceBase {
    /// Wall-clock time relative to the base. Saturating, so sentinel
    /// extremes clamp instead of wrapping; ordinary values, including
    /// pre-base ones, subtract exactly.
    fn rel_time(self, time: WallTime) -> i64 {
        time.micros().saturating_sub(self.time)
    }

    fn rel_timestamp(self, ts: LogicalTime) -> i64 {
        ts.value().saturating_sub(self.timestamp)
    }
}

/// Interner pair shared by both assembly modes.
#[derive(Debug, Default)]
struct IdTables {
    streams: StreamNameIndex,
    packets: PacketIdIndex,
}

/// Builds structured traces from windows of a shared event buffer.
///
/// One instance serves one trace consumer. Calls mutate the indices and
/// interners in place, so concurrent calls on a single instance must be
/// serialized by the caller; independent instances share nothing and
/// may run concurrently over one buffer.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    /// Packet-detail events grouped by invocation, accumulated across
    /// windows until `reset`.
    invocations: HashMap<InvocationKey, Vec<TraceEvent>>,
    /// The producing finish event for each observed hop.
    producers: HashMap<HopKey, TraceEvent>,
    ids: IdTables,
    base: Option<TraceBase>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The logical time one past the newest input timestamp among the
    /// events before `begin`. Starting the next window there keeps a
    /// caller from re-reading invocations it already consumed.
    pub fn timestamp_after(buffer: &EventBuffer, begin: WallTime) -> LogicalTime {
        let mut max_ts = LogicalTime::MIN;
        for event in buffer.iter() {
            if event.event_time >= begin {
                break;
            }
            max_ts = max_ts.max(event.input_ts);
        }
        max_ts.next()
    }

    /// Builds an aggregated trace for the events in `[begin, end)`.
    ///
    /// Each invocation becomes one record merging every event indexed
    /// under its key so far, including events indexed by earlier
    /// windows. Events carrying no packet detail pass through as
    /// standalone records at their snapshot position. Re-processing a
    /// window re-indexes its events, so hop sub-records repeat if the
    /// same window is built twice.
    pub fn build_trace(
        &mut self,
        buffer: &EventBuffer,
        begin: WallTime,
        end: WallTime,
    ) -> GraphTrace {
        let snapshot = buffer.snapshot(begin, end);
        let base = self.calibrate(&snapshot);
        self.index(&snapshot);

        let mut trace = GraphTrace {
            base_time: base.time,
            base_timestamp: base.timestamp,
            ..GraphTrace::default()
        };
        let mut emitted: HashSet<InvocationKey> = HashSet::new();
        for event in &snapshot {
            if !event.kind.has_packet_detail() {
                trace.node_traces.push(event_record(event, &mut self.ids, base));
                continue;
            }
            let key = InvocationKey::of(event);
            if emitted.insert(key) {
                if let Some(events) = self.invocations.get(&key) {
                    trace
                        .node_traces
                        .push(invocation_record(events, &self.producers, &mut self.ids, base));
                }
            }
        }
        trace.stream_names = self.ids.streams.names();
        trace
    }

    /// Builds a verbatim log for the events in `[begin, end)`: one
    /// record per raw event, with no grouping, no indexing, and no
    /// producer correlation.
    pub fn build_log(
        &mut self,
        buffer: &EventBuffer,
        begin: WallTime,
        end: WallTime,
    ) -> GraphTrace {
        let snapshot = buffer.snapshot(begin, end);
        let base = self.calibrate(&snapshot);

        let mut trace = GraphTrace {
            base_time: base.time,
            base_timestamp: base.timestamp,
            ..GraphTrace::default()
        };
        for event in &snapshot {
            trace.node_traces.push(event_record(event, &mut self.ids, base));
        }
        trace.stream_names = self.ids.streams.names();
        trace
    }

    /// Clears the invocation and producer indices. The interners and
    /// the time base survive, so records built before and after a reset
    /// stay in one reference frame with one id space.
    pub fn reset(&mut self) {
        self.invocations.clear();
        self.producers.clear();
    }

    /// Fixes the zero points from the first snapshot ever processed;
    /// afterwards a no-op. An empty first snapshot fixes both at 0.
    fn calibrate(&mut self, snapshot: &[TraceEvent]) -> TraceBase {
        if let Some(base) = self.base {
            return base;
        }
        let mut time = i64::MAX;
        let mut timestamp = i64::MAX;
        for event in snapshot {
            if !event.input_ts.is_unset() {
                timestamp = timestamp.min(event.input_ts.value());
            }
            if !event.packet_ts.is_unset() {
                timestamp = timestamp.min(event.packet_ts.value());
            }
            time = time.min(event.event_time.micros());
        }
        let base = TraceBase {
            time: if time == i64::MAX { 0 } else { time },
            timestamp: if timestamp == i64::MAX { 0 } else { timestamp },
        };
        self.base = Some(base);
        base
    }

    /// Indexes a snapshot's packet-detail events by invocation and, for
    /// finish events, by hop.
    fn index(&mut self, snapshot: &[TraceEvent]) {
        for event in snapshot {
            if !event.kind.has_packet_detail() {
                continue;
            }
            if event.is_finish {
                let key = HopKey {
                    stream_id: self.ids.streams.intern(event.stream.as_ref()),
                    packet_ts: event.packet_ts,
                    kind: event.kind,
                };
                // The first finish seen for a hop is the producing
                // side; a later finish with the same key is a consumer
                // and must not displace it.
                self.producers.entry(key).or_insert_with(|| event.clone());
            }
            self.invocations
                .entry(InvocationKey::of(event))
                .or_default()
                .push(event.clone());
        }
    }
}

/// One standalone record for a raw event. Shared by the verbatim log
/// and by the aggregated trace's pass-through of non-packet events.
fn event_record(event: &TraceEvent, ids: &mut IdTables, base: TraceBase) -> NodeTrace {
    let mut record = NodeTrace {
        node_id: event.node_id,
        kind: event.kind,
        thread_id: event.thread_id,
        ..NodeTrace::default()
    };
    if event.is_finish {
        record.finish_time = Some(base.rel_time(event.event_time));
    } else {
        record.start_time = Some(base.rel_time(event.event_time));
    }
    if !event.input_ts.is_unset() {
        record.input_timestamp = Some(base.rel_timestamp(event.input_ts));
    }
    if event.kind.emits_stream_hop() && event.stream.is_some() {
        let mut hop = hop_identity(event, ids, base);
        hop.packet_id = ids.packets.intern(event.packet_data_id);
        if event.is_finish {
            record.outputs.push(hop);
        } else {
            record.inputs.push(hop);
        }
    }
    record
}

/// One record merging every indexed event of one invocation.
fn invocation_record(
    events: &[TraceEvent],
    producers: &HashMap<HopKey, TraceEvent>,
    ids: &mut IdTables,
    base: TraceBase,
) -> NodeTrace {
    let mut record = NodeTrace::default();
    if let Some(first) = events.first() {
        record.node_id = first.node_id;
        record.kind = first.kind;
        record.input_timestamp = Some(base.rel_timestamp(first.input_ts));
        record.thread_id = first.thread_id;
    }
    let mut start: Option<WallTime> = None;
    let mut finish: Option<WallTime> = None;
    for event in events {
        let earliest = if event.is_finish { &mut finish } else { &mut start };
        *earliest = Some(earliest.map_or(event.event_time, |t| t.min(event.event_time)));

        if event.kind.emits_stream_hop() && event.stream.is_some() {
            if event.is_finish {
                record.outputs.push(output_hop(event, producers, ids, base));
            } else {
                record.inputs.push(hop_identity(event, ids, base));
            }
        }
    }
    record.start_time = start.map(|t| base.rel_time(t));
    record.finish_time = finish.map(|t| base.rel_time(t));
    record
}

/// Stream id and packet timestamp, common to every hop record.
fn hop_identity(event: &TraceEvent, ids: &mut IdTables, base: TraceBase) -> StreamHop {
    StreamHop {
        stream_id: ids.streams.intern(event.stream.as_ref()),
        packet_timestamp: base.rel_timestamp(event.packet_ts),
        ..StreamHop::default()
    }
}

/// A fully resolved output hop: receipt time, payload identity, and the
/// producer's emit time when a distinct producing event is on record.
fn output_hop(
    event: &TraceEvent,
    producers: &HashMap<HopKey, TraceEvent>,
    ids: &mut IdTables,
    base: TraceBase,
) -> StreamHop {
    let mut hop = hop_identity(event, ids, base);
    hop.finish_time = Some(base.rel_time(event.event_time));
    hop.packet_id = ids.packets.intern(event.packet_data_id);
    let key = HopKey {
        stream_id: hop.stream_id,
        packet_ts: event.packet_ts,
        kind: event.kind,
    };
    // An event is never its own producer.
    if let Some(producer) = producers.get(&key) {
        if producer != event {
            hop.start_time = Some(base.rel_time(producer.event_time));
        }
    }
    hop
}
