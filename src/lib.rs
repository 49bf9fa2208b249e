//! voxloop - Streaming speech-to-speech conversation pipeline
//!
//! Captured audio is transcribed into utterances, each utterance drives a
//! token-by-token generated reply, the reply is chunked incrementally and
//! synthesized, and the audio plays back strictly in generation order.
//! Model backends and audio devices stay behind collaborator traits.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod chunk;
pub mod config;
pub mod defaults;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod stt;
pub mod tts;

// Collaborator traits (capture → transcribe → generate → synthesize → play)
pub use audio::capture::CaptureSource;
pub use audio::sink::{AudioSink, CollectorSink, WavFileSink};
pub use llm::generator::Generator;
pub use stt::transcriber::Transcriber;
pub use tts::synthesizer::{AudioSegment, Synthesizer};

// Pipeline
pub use pipeline::controller::{
    Pipeline, PipelineConfig, PipelineHandle, PipelineState, UtteranceSender,
};
pub use pipeline::types::{
    AudioChunk, AudioFrame, PipelineEvent, TextChunk, TokenFragment, Utterance,
};

// Chunking policy
pub use chunk::{ChunkAggregator, ChunkPolicy, SpokenTextPolicy};

// Error handling
pub use error::{Result, VoxloopError};

// Config
pub use config::Config;

// Stage framework (for advanced users)
pub use pipeline::error::{ErrorReporter, StageError};
pub use pipeline::signal::ShutdownSignal;
pub use pipeline::stage::Stage;
