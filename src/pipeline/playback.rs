//! Playback stage: plays audio chunks strictly in arrival order.

use crate::audio::sink::AudioSink;
use crate::pipeline::error::StageError;
use crate::pipeline::queue::StageSender;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::{AudioChunk, PipelineEvent, emit_event};
use crossbeam_channel::Sender;

/// Terminal stage that hands each chunk to the audio sink.
///
/// `AudioSink::play` blocks until the chunk has finished, so chunk N+1
/// never starts before chunk N ends even when it is already queued. This is the
/// pipeline's ordering guarantee at the speaker.
pub struct PlaybackStage {
    sink: Box<dyn AudioSink>,
    event_tx: Option<Sender<PipelineEvent>>,
}

impl PlaybackStage {
    /// Creates a playback stage over the given sink.
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            event_tx: None,
        }
    }

    /// Attach an observer channel for playback events.
    pub fn with_event_sender(mut self, tx: Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }
}

impl Stage for PlaybackStage {
    type Input = AudioChunk;
    type Output = ();

    fn name(&self) -> &'static str {
        "playback"
    }

    fn process(
        &mut self,
        chunk: AudioChunk,
        _output: &StageSender<()>,
    ) -> Result<(), StageError> {
        let sequence = chunk.sequence;
        self.sink
            .play(&chunk)
            .map_err(|e| StageError::Recoverable(format!("playback failed: {}", e)))?;

        emit_event(&self.event_tx, PipelineEvent::ChunkPlayed { sequence });
        Ok(())
    }

    fn shutdown(&mut self) {
        self.sink.finish();
    }
}
