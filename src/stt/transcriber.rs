use crate::error::{Result, VoxloopError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (a real model vs mock).
pub trait Transcriber: Send + Sync {
    /// Transcribe one captured frame to text.
    ///
    /// # Arguments
    /// * `samples` - Audio samples as 16-bit PCM mono
    ///
    /// # Returns
    /// Transcribed text (possibly empty for silence) or error
    fn transcribe(&self, samples: &[i16]) -> Result<String>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across stages.
impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(&self, samples: &[i16]) -> Result<String> {
        (**self).transcribe(samples)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing.
///
/// Plays back a script of per-frame responses; the utterance detector needs
/// frame-to-frame variation to exercise its turn heuristic. Once the script
/// runs out, every further frame transcribes to the fallback text.
#[derive(Debug, Default)]
pub struct MockTranscriber {
    model_name: String,
    script: Vec<String>,
    cursor: AtomicUsize,
    fallback: String,
    should_fail: bool,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            script: Vec::new(),
            cursor: AtomicUsize::new(0),
            fallback: String::new(),
            should_fail: false,
        }
    }

    /// Configure the mock to return one specific response for every frame
    pub fn with_response(mut self, response: &str) -> Self {
        self.fallback = response.to_string();
        self
    }

    /// Configure a per-frame response script
    pub fn with_script(mut self, script: Vec<&str>) -> Self {
        self.script = script.into_iter().map(str::to_string).collect();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _samples: &[i16]) -> Result<String> {
        if self.should_fail {
            return Err(VoxloopError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .script
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
