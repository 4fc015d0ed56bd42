//! Core event and trace types for the Weft dataflow runtime.
//!
//! This crate defines the data structures shared between the runtime's
//! event producers and the trace reconstruction engine: the low-level
//! scheduling/transfer events, the time representations, the structured
//! trace output model, and the error type for the serialization
//! boundary. It contains no engine logic.

pub mod error;
pub mod event;
pub mod journal;
pub mod time;
pub mod trace;

pub use error::{Error, Result};
pub use event::{EventKind, PacketDataId, TraceEvent};
pub use time::{LogicalTime, WallTime};
pub use trace::{GraphTrace, NodeTrace, StreamHop};
