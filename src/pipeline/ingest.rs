//! Ingest stage: turns captured frames into completed utterances.

use crate::pipeline::error::StageError;
use crate::pipeline::queue::StageSender;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::{AudioFrame, PipelineEvent, Utterance, emit_event};
use crate::stt::transcriber::Transcriber;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Stage that transcribes frames and detects turn boundaries.
///
/// Every frame runs through the transcriber. A frame below the minimum
/// word count means the user has stopped speaking: the text accumulated so
/// far is emitted as one utterance. Frames at or above the threshold extend
/// the current turn.
pub struct IngestStage {
    transcriber: Arc<dyn Transcriber>,
    min_utterance_words: usize,
    turn: String,
    next_sequence: u64,
    event_tx: Option<Sender<PipelineEvent>>,
}

impl IngestStage {
    /// Creates an ingest stage with the given turn threshold.
    pub fn new(transcriber: Arc<dyn Transcriber>, min_utterance_words: usize) -> Self {
        Self {
            transcriber,
            min_utterance_words,
            turn: String::new(),
            next_sequence: 0,
            event_tx: None,
        }
    }

    /// Attach an observer channel for utterance events.
    pub fn with_event_sender(mut self, tx: Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn emit_turn(&mut self, output: &StageSender<Utterance>) -> Result<(), StageError> {
        if self.turn.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.turn);
        emit_event(
            &self.event_tx,
            PipelineEvent::UtteranceCaptured { text: text.clone() },
        );
        let utterance = Utterance::new(text, self.next_sequence);
        self.next_sequence += 1;
        output.send(utterance)?;
        Ok(())
    }
}

impl Stage for IngestStage {
    type Input = AudioFrame;
    type Output = Utterance;

    fn name(&self) -> &'static str {
        "ingest"
    }

    fn process(
        &mut self,
        frame: AudioFrame,
        output: &StageSender<Utterance>,
    ) -> Result<(), StageError> {
        let text = self
            .transcriber
            .transcribe(&frame.samples)
            .map_err(|e| StageError::Recoverable(format!("transcription failed: {}", e)))?;
        let text = text.trim();

        if text.split_whitespace().count() < self.min_utterance_words {
            // The user paused: close the turn
            return self.emit_turn(output);
        }

        if !self.turn.is_empty() {
            self.turn.push(' ');
        }
        self.turn.push_str(text);
        Ok(())
    }

    fn drain(&mut self, output: &StageSender<Utterance>) {
        // The capture source ended; the last turn still counts. A closed
        // downstream means the pipeline is already draining.
        let _ = self.emit_turn(output);
    }
}
