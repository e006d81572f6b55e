//! Recording system module
//!
//! - `KindSession`: the per-kind session record (stream, recorder, chunks,
//!   finalized resource, recording flag)
//! - `RecorderEvents`: the queue recorder notifications arrive on
//! - controller operations: bind, start, stop, append, finalize

pub mod controller;
pub mod state;

pub use controller::{Applied, RecorderEvents};
pub use state::{BoundRecorder, KindSession, RecordingSession};
