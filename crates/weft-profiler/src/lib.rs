//! Trace reconstruction engine for the Weft dataflow runtime.
//!
//! The scheduler and calculator dispatch emit low-level
//! [`TraceEvent`](weft_core::TraceEvent)s into a shared [`EventBuffer`].
//! This crate turns wall-clock windows of that buffer into structured
//! [`GraphTrace`](weft_core::GraphTrace)s: per-invocation timelines,
//! producer/consumer links for each packet hop, and aggregate latency
//! summaries.

pub mod buffer;
pub mod builder;
pub mod intern;
pub mod summary;

pub use buffer::{EventBuffer, SharedEventBuffer, DEFAULT_CAPACITY};
pub use builder::TraceBuilder;
pub use intern::{PacketIdIndex, StreamNameIndex};
pub use summary::{summarize, NodeSummary, StreamSummary, TraceSummary};
