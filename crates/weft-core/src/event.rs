//! Scheduling and data-transfer events observed by the runtime.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::time::{LogicalTime, WallTime};

/// The kind of activity a trace event records.
///
/// The discriminants are stable and index the per-kind behavior tables,
/// so variants must not be reordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[default]
    Unknown = 0,
    /// A calculator's Open invocation.
    Open,
    /// A calculator's Process invocation.
    Process,
    /// A calculator's Close invocation.
    Close,
    /// A node was inspected and found not ready to run.
    NotReady,
    /// A node became ready for Process.
    ReadyForProcess,
    /// A node became ready for Close.
    ReadyForClose,
    /// A node was throttled by flow control.
    Throttled,
    /// A node was released from throttling.
    Unthrottled,
    /// User-mode CPU work attributed to an invocation.
    CpuTaskUser,
    /// Kernel-mode CPU work attributed to an invocation.
    CpuTaskSystem,
    /// Work dispatched to a GPU.
    GpuTask,
    /// Work dispatched to a DSP.
    DspTask,
    /// Work dispatched to a TPU.
    TpuTask,
}

// Per-kind behavior tables, indexed by discriminant:
//   Unknown, Open, Process, Close,
//   NotReady, ReadyForProcess, ReadyForClose, Throttled, Unthrottled,
//   CpuTaskUser, CpuTaskSystem, GpuTask, DspTask, TpuTask
const PACKET_DETAIL: [bool; EventKind::COUNT] = [
    false, true, true, true, //
    false, false, false, false, false, //
    true, true, true, true, true,
];

const STREAM_HOP: [bool; EventKind::COUNT] = [
    false, true, true, true, //
    false, false, false, false, false, //
    true, true, false, false, false,
];

impl EventKind {
    /// Number of kinds; sizes the behavior tables.
    pub const COUNT: usize = 14;

    /// Every kind, in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Unknown,
        Self::Open,
        Self::Process,
        Self::Close,
        Self::NotReady,
        Self::ReadyForProcess,
        Self::ReadyForClose,
        Self::Throttled,
        Self::Unthrottled,
        Self::CpuTaskUser,
        Self::CpuTaskSystem,
        Self::GpuTask,
        Self::DspTask,
        Self::TpuTask,
    ];

    /// Whether events of this kind carry packet-level detail (input
    /// timestamp, payload identity) worth indexing by invocation.
    pub const fn has_packet_detail(self) -> bool {
        PACKET_DETAIL[self as usize]
    }

    /// Whether events of this kind describe a packet crossing a stream
    /// and therefore produce a stream-hop sub-record.
    pub const fn emits_stream_hop(self) -> bool {
        STREAM_HOP[self as usize]
    }
}

/// Opaque identity of a packet's payload storage.
///
/// Only ever compared for equality to correlate transfers; never
/// dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketDataId(pub u64);

/// One observation of scheduling or data-transfer activity.
///
/// Events are appended continuously by the scheduler's worker threads
/// and are read-only to the trace engine. Cloning bumps the stream-name
/// refcount and copies the scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Graph node the event belongs to; 0 when no node applies.
    pub node_id: i32,
    /// Name of the stream involved in a transfer, shared with the graph
    /// definition.
    pub stream: Option<Arc<str>>,
    pub kind: EventKind,
    /// True for the completion/receive side, false for start/send.
    pub is_finish: bool,
    /// Logical timestamp of the invocation's current input.
    pub input_ts: LogicalTime,
    /// Logical timestamp of the packet involved in a transfer.
    pub packet_ts: LogicalTime,
    pub event_time: WallTime,
    pub thread_id: i32,
    /// Identity of the packet's payload storage, if any.
    pub packet_data_id: Option<PacketDataId>,
}

impl TraceEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            node_id: 0,
            stream: None,
            kind,
            is_finish: false,
            input_ts: LogicalTime::UNSET,
            packet_ts: LogicalTime::UNSET,
            event_time: WallTime::from_micros(0),
            thread_id: 0,
            packet_data_id: None,
        }
    }

    pub fn with_node(mut self, node_id: i32) -> Self {
        self.node_id = node_id;
        self
    }

    pub fn with_stream(mut self, stream: Arc<str>) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_finish(mut self, is_finish: bool) -> Self {
        self.is_finish = is_finish;
        self
    }

    pub fn with_input_ts(mut self, input_ts: LogicalTime) -> Self {
        self.input_ts = input_ts;
        self
    }

    pub fn with_packet_ts(mut self, packet_ts: LogicalTime) -> Self {
        self.packet_ts = packet_ts;
        self
    }

    pub fn at(mut self, event_time: WallTime) -> Self {
        self.event_time = event_time;
        self
    }

    pub fn with_thread(mut self, thread_id: i32) -> Self {
        self.thread_id = thread_id;
        self
    }

    pub fn with_packet(mut self, packet_data_id: PacketDataId) -> Self {
        self.packet_data_id = Some(packet_data_id);
        self
    }
}
