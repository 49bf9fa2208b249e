use crate::error::{Result, VoxloopError};

/// Trait for audio capture sources.
///
/// Real microphone backends live behind this trait; the pipeline itself
/// only ever polls `read_samples`.
pub trait CaptureSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read the next block of 16-bit PCM samples.
    ///
    /// An empty read from a finite source means the source is exhausted;
    /// from a live source it just means no audio is available yet.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Whether this source ends on its own (file, fixed script) rather
    /// than running until shutdown (microphone).
    fn is_finite(&self) -> bool {
        false
    }
}

/// One phase of a scripted capture sequence: `count` reads each returning
/// `samples`.
#[derive(Debug, Clone)]
pub struct FramePhase {
    pub samples: Vec<i16>,
    pub count: usize,
}

/// Mock capture source for testing.
///
/// Walks through its frame phases, then returns empty reads. Finite by
/// default so pipelines drain naturally when the script ends.
#[derive(Debug, Clone, Default)]
pub struct MockCaptureSource {
    phases: Vec<FramePhase>,
    phase: usize,
    emitted: usize,
    started: bool,
    live: bool,
    should_fail_start: bool,
    should_fail_read: bool,
}

impl MockCaptureSource {
    /// Create a new mock capture source with no frames
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the frame sequence returned by successive reads
    pub fn with_frame_sequence(mut self, phases: Vec<FramePhase>) -> Self {
        self.phases = phases;
        self
    }

    /// Treat this source as live: empty reads keep the pipeline polling
    pub fn as_live_source(mut self) -> Self {
        self.live = true;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on every read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Check if the source is started
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl CaptureSource for MockCaptureSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(VoxloopError::AudioCapture {
                message: "mock capture start failure".to_string(),
            });
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(VoxloopError::AudioCapture {
                message: "mock capture read failure".to_string(),
            });
        }

        while let Some(phase) = self.phases.get(self.phase) {
            if self.emitted < phase.count {
                self.emitted += 1;
                return Ok(phase.samples.clone());
            }
            self.phase += 1;
            self.emitted = 0;
        }

        // Script exhausted
        Ok(Vec::new())
    }

    fn is_finite(&self) -> bool {
        !self.live
    }
}
