//! Audio device boundaries: capture sources and playback sinks.

pub mod capture;
pub mod sink;

pub use capture::{CaptureSource, FramePhase, MockCaptureSource};
#[cfg(feature = "playback")]
pub use sink::RodioSink;
pub use sink::{AudioSink, CollectorSink, WavFileSink};
