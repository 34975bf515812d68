//! Progress observability primitives.
//!
//! Every successful job write produces a [`JobProgress`] event. Sinks receive
//! events without blocking the writer; a slow or absent listener only loses events.

pub mod bus;
pub mod event;

pub use bus::{FanOut, NoopSink, ProgressBus, ProgressSink};
pub use event::JobProgress;
