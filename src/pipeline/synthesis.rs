//! Synthesis stage: renders text chunks into playable audio.

use crate::pipeline::error::StageError;
use crate::pipeline::queue::StageSender;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::{AudioChunk, PipelineEvent, TextChunk, emit_event};
use crate::tts::synthesizer::Synthesizer;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Stage that synthesizes one audio chunk per text chunk.
///
/// All synthesizer segments for a chunk are concatenated before anything is
/// enqueued: playback ordering is defined at chunk granularity, so segments
/// must never travel downstream on their own.
pub struct SynthesisStage {
    synthesizer: Arc<dyn Synthesizer>,
    event_tx: Option<Sender<PipelineEvent>>,
}

impl SynthesisStage {
    /// Creates a synthesis stage.
    pub fn new(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            synthesizer,
            event_tx: None,
        }
    }

    /// Attach an observer channel for synthesis events.
    pub fn with_event_sender(mut self, tx: Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }
}

impl Stage for SynthesisStage {
    type Input = TextChunk;
    type Output = AudioChunk;

    fn name(&self) -> &'static str {
        "synthesis"
    }

    fn process(
        &mut self,
        chunk: TextChunk,
        output: &StageSender<AudioChunk>,
    ) -> Result<(), StageError> {
        // Nothing speakable survived formatting upstream: drop, not an error
        if chunk.text.trim().is_empty() {
            return Ok(());
        }

        let segments = self
            .synthesizer
            .synthesize(&chunk.text)
            .map_err(|e| StageError::Recoverable(format!("synthesis failed: {}", e)))?;

        let total: usize = segments.iter().map(|s| s.samples.len()).sum();
        if total == 0 {
            // Valid but silent output: skip the chunk, keep the stream alive
            return Ok(());
        }

        let mut samples = Vec::with_capacity(total);
        for segment in segments {
            samples.extend_from_slice(&segment.samples);
        }

        emit_event(
            &self.event_tx,
            PipelineEvent::ChunkSynthesized {
                sequence: chunk.sequence,
                samples: samples.len(),
            },
        );

        output.send(AudioChunk::new(
            samples,
            self.synthesizer.sample_rate(),
            chunk.sequence,
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::{StageItem, stage_queue};
    use crate::tts::synthesizer::MockSynthesizer;
    use std::time::Duration;

    fn drain_audio(rx: &crate::pipeline::queue::StageReceiver<AudioChunk>) -> Vec<AudioChunk> {
        let mut out = Vec::new();
        while let Some(StageItem::Item(c)) = rx.recv_timeout(Duration::from_millis(10)) {
            out.push(c);
        }
        out
    }

    #[test]
    fn one_audio_chunk_per_text_chunk() {
        let synthesizer = Arc::new(MockSynthesizer::new("voice"));
        let mut stage = SynthesisStage::new(synthesizer);
        let (tx, rx) = stage_queue(8);

        stage.process(TextChunk::new("Hello.", 0), &tx).unwrap();
        stage.process(TextChunk::new("World.", 1), &tx).unwrap();

        let chunks = drain_audio(&rx);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].sequence, 0);
        assert_eq!(chunks[1].sequence, 1);
        assert_eq!(chunks[0].sample_rate, 24_000);
    }

    #[test]
    fn segments_concatenate_in_order() {
        let synthesizer = Arc::new(MockSynthesizer::new("voice").with_segments(3));
        let mut stage = SynthesisStage::new(synthesizer);
        let (tx, rx) = stage_queue(8);

        stage.process(TextChunk::new("abcd", 0), &tx).unwrap();

        let chunks = drain_audio(&rx);
        assert_eq!(chunks.len(), 1);
        // Each mock segment holds one sample per character, filled with
        // its segment index
        assert_eq!(chunks[0].samples.len(), 12);
        assert_eq!(&chunks[0].samples[0..4], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&chunks[0].samples[4..8], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(&chunks[0].samples[8..12], &[2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn zero_segments_drops_chunk_silently() {
        let synthesizer = Arc::new(MockSynthesizer::new("voice").with_segments(0));
        let mut stage = SynthesisStage::new(synthesizer);
        let (tx, rx) = stage_queue(8);

        stage.process(TextChunk::new("silent.", 0), &tx).unwrap();
        stage.process(TextChunk::new("also silent.", 1), &tx).unwrap();

        assert!(drain_audio(&rx).is_empty());
    }

    #[test]
    fn whitespace_only_chunk_is_dropped_before_synthesis() {
        // A failing synthesizer would error if invoked
        let synthesizer = Arc::new(MockSynthesizer::new("voice").with_failure());
        let mut stage = SynthesisStage::new(synthesizer);
        let (tx, rx) = stage_queue(8);

        stage.process(TextChunk::new("   ", 0), &tx).unwrap();
        assert!(drain_audio(&rx).is_empty());
    }

    #[test]
    fn synthesis_failure_is_recoverable_and_stage_continues() {
        let synthesizer = Arc::new(MockSynthesizer::new("voice").with_initial_failures(1));
        let mut stage = SynthesisStage::new(synthesizer);
        let (tx, rx) = stage_queue(8);

        let failed = stage.process(TextChunk::new("Dropped.", 0), &tx);
        assert!(matches!(failed, Err(StageError::Recoverable(_))));

        stage.process(TextChunk::new("Spoken.", 1), &tx).unwrap();

        let chunks = drain_audio(&rx);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].sequence, 1);
    }

    #[test]
    fn synthesis_event_carries_sample_count() {
        let (event_tx, event_rx) = crossbeam_channel::bounded(8);
        let synthesizer = Arc::new(MockSynthesizer::new("voice"));
        let mut stage = SynthesisStage::new(synthesizer).with_event_sender(event_tx);
        let (tx, _rx) = stage_queue(8);

        stage.process(TextChunk::new("12345", 7), &tx).unwrap();

        assert_eq!(
            event_rx.try_recv().unwrap(),
            PipelineEvent::ChunkSynthesized {
                sequence: 7,
                samples: 5
            }
        );
    }
}
