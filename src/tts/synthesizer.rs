use crate::defaults;
use crate::error::{Result, VoxloopError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// One synthesizer sub-segment: a raw mono sample buffer.
///
/// A synthesizer may split one text chunk into several segments; their
/// order must be preserved when they are concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    pub samples: Vec<f32>,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}

/// Trait for speech synthesis.
///
/// This trait allows swapping implementations (a real TTS engine vs mock).
pub trait Synthesizer: Send + Sync {
    /// Synthesize one text chunk into an ordered, finite segment sequence.
    ///
    /// An empty sequence is a valid answer for speakable-but-silent input.
    fn synthesize(&self, text: &str) -> Result<Vec<AudioSegment>>;

    /// Sample rate of produced segments in Hz.
    fn sample_rate(&self) -> u32;

    /// Get the name of the active voice
    fn voice_name(&self) -> &str;

    /// Check if the synthesizer is ready
    fn is_ready(&self) -> bool;
}

/// Implement Synthesizer for Arc<T> to allow sharing across stages.
impl<T: Synthesizer> Synthesizer for Arc<T> {
    fn synthesize(&self, text: &str) -> Result<Vec<AudioSegment>> {
        (**self).synthesize(text)
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn voice_name(&self) -> &str {
        (**self).voice_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock synthesizer for testing.
///
/// Produces `segments` segments per chunk, each holding one sample per
/// character of input filled with the segment index, so tests can verify both
/// segment order after concatenation and how much text was spoken.
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    voice_name: String,
    sample_rate: u32,
    segments: usize,
    should_fail: bool,
    failures_remaining: AtomicU32,
}

impl MockSynthesizer {
    /// Create a new mock synthesizer with default settings
    pub fn new(voice_name: &str) -> Self {
        Self {
            voice_name: voice_name.to_string(),
            sample_rate: defaults::PLAYBACK_SAMPLE_RATE,
            segments: 1,
            should_fail: false,
            failures_remaining: AtomicU32::new(0),
        }
    }

    /// Configure how many segments each chunk synthesizes into.
    /// Zero means every chunk yields no audio.
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Configure the sample rate reported for produced segments
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Configure the mock to fail on every call
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to fail only the first `count` calls
    pub fn with_initial_failures(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::Relaxed);
        self
    }
}

impl Synthesizer for MockSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<AudioSegment>> {
        if self.should_fail {
            return Err(VoxloopError::Synthesis {
                message: "mock synthesis failure".to_string(),
            });
        }
        let countdown = self.failures_remaining.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |n| n.checked_sub(1),
        );
        if countdown.is_ok() {
            return Err(VoxloopError::Synthesis {
                message: "mock synthesis failure".to_string(),
            });
        }

        let samples_per_segment = text.chars().count();
        Ok((0..self.segments)
            .map(|index| AudioSegment::new(vec![index as f32; samples_per_segment]))
            .collect())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn voice_name(&self) -> &str {
        &self.voice_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
