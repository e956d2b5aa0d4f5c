//! One control session: frames in, vehicle commands and annotated frames out.

mod dispatch;
mod pipeline;
mod retry;
mod runtime;

pub use pipeline::Pilot;
pub use runtime::{FrameSink, NullSink, PngSequenceSink, SessionEnd, run_session};
