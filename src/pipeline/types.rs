//! Data types flowing between pipeline stages.

use crossbeam_channel::Sender;

/// One completed user turn, ready for reply generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// The transcribed turn text.
    pub text: String,
    /// Sequence number for ordering.
    pub sequence: u64,
}

impl Utterance {
    pub fn new(text: impl Into<String>, sequence: u64) -> Self {
        Self {
            text: text.into(),
            sequence,
        }
    }
}

/// One increment of generated reply text.
///
/// Fragments are consumed by the aggregator as they arrive and are never
/// queued themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenFragment {
    pub content: String,
}

impl TokenFragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// A formatted, synthesis-ready span of reply text.
///
/// Chunks are totally ordered by `sequence`, matching generation order,
/// the central invariant of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub sequence: u64,
}

impl TextChunk {
    pub fn new(text: impl Into<String>, sequence: u64) -> Self {
        Self {
            text: text.into(),
            sequence,
        }
    }
}

/// One playable waveform: the concatenated synthesizer output for a single
/// text chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Mono samples in the -1.0..1.0 range.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sequence number of the text chunk this audio was derived from.
    pub sequence: u64,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>, sample_rate: u32, sequence: u64) -> Self {
        Self {
            samples,
            sample_rate,
            sequence,
        }
    }

    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// A block of captured PCM handed to the ingest stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// PCM samples (16-bit signed integers).
    pub samples: Vec<i16>,
    /// Sequence number for ordering and gap detection.
    pub sequence: u64,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, sequence: u64) -> Self {
        Self { samples, sequence }
    }
}

/// Progress events streamed to an optional observer channel.
///
/// Delivery is best-effort: stages use a non-blocking send and drop events
/// when the observer falls behind, so observation never stalls the
/// pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A completed user turn entered the pipeline.
    UtteranceCaptured { text: String },
    /// One token fragment arrived from the generator (live display).
    TokenGenerated { content: String },
    /// A text chunk was synthesized into audio.
    ChunkSynthesized { sequence: u64, samples: usize },
    /// A chunk finished playing.
    ChunkPlayed { sequence: u64 },
}

/// Best-effort event emission used by all stages.
pub(crate) fn emit_event(tx: &Option<Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = tx {
        // Full or closed observer channels are ignored
        let _ = tx.try_send(event);
    }
}
