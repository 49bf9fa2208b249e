//! Multi-stage speech pipeline.
//!
//! Each stage runs in its own thread, connected by bounded queues that
//! carry either payloads or an explicit end-of-stream marker. Shutdown is
//! cooperative: the controller latches a shared signal, stages observe it
//! between units, and the marker cascades downstream so every stage
//! terminates deterministically.

pub mod controller;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod playback;
pub mod queue;
pub mod signal;
pub mod stage;
pub mod synthesis;
pub mod types;

pub use controller::{
    Pipeline, PipelineConfig, PipelineHandle, PipelineState, UtteranceSender,
};
pub use error::{ErrorReporter, LogReporter, StageError};
pub use generation::GenerationStage;
pub use ingest::IngestStage;
pub use playback::PlaybackStage;
pub use queue::{QueueClosed, StageItem, StageReceiver, StageSender, TrySendError, stage_queue};
pub use signal::ShutdownSignal;
pub use stage::{Stage, StageRunner};
pub use synthesis::SynthesisStage;
pub use types::{AudioChunk, AudioFrame, PipelineEvent, TextChunk, TokenFragment, Utterance};
