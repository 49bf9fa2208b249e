//! Generation stage: drives the reply generator and cuts its token stream
//! into ordered text chunks.

use crate::chunk::ChunkAggregator;
use crate::llm::generator::Generator;
use crate::pipeline::error::StageError;
use crate::pipeline::queue::StageSender;
use crate::pipeline::signal::ShutdownSignal;
use crate::pipeline::stage::Stage;
use crate::pipeline::types::{PipelineEvent, TextChunk, Utterance, emit_event};
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Stage that consumes one utterance at a time and streams the generated
/// reply downstream as formatted chunks.
///
/// Chunk sequence numbers are monotonic across utterances; downstream
/// ordering checks rely on that.
pub struct GenerationStage {
    generator: Arc<dyn Generator>,
    aggregator: ChunkAggregator,
    shutdown: ShutdownSignal,
    next_sequence: u64,
    event_tx: Option<Sender<PipelineEvent>>,
}

impl GenerationStage {
    /// Creates a generation stage.
    ///
    /// The shutdown signal is checked between token fragments: a reply is
    /// the one unit of work long enough to need a mid-unit checkpoint.
    pub fn new(
        generator: Arc<dyn Generator>,
        aggregator: ChunkAggregator,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            generator,
            aggregator,
            shutdown,
            next_sequence: 0,
            event_tx: None,
        }
    }

    /// Attach an observer channel for token events (live display).
    pub fn with_event_sender(mut self, tx: Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_chunk(
        &mut self,
        text: String,
        output: &StageSender<TextChunk>,
    ) -> Result<(), StageError> {
        let chunk = TextChunk::new(text, self.next_sequence);
        self.next_sequence += 1;
        output.send(chunk)?;
        Ok(())
    }
}

impl Stage for GenerationStage {
    type Input = Utterance;
    type Output = TextChunk;

    fn name(&self) -> &'static str {
        "generation"
    }

    fn process(
        &mut self,
        utterance: Utterance,
        output: &StageSender<TextChunk>,
    ) -> Result<(), StageError> {
        if utterance.text.trim().is_empty() {
            return Ok(());
        }

        let stream = self
            .generator
            .generate(&utterance)
            .map_err(|e| StageError::Recoverable(format!("generation failed: {}", e)))?;

        for fragment in stream {
            // Shutdown observed mid-reply: stop consuming and discard the
            // partial buffer. Chunks already sent are complete units and
            // stay in flight.
            if self.shutdown.is_triggered() {
                self.aggregator.reset();
                return Ok(());
            }

            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(e) => {
                    self.aggregator.reset();
                    return Err(StageError::Recoverable(format!(
                        "token stream failed: {}",
                        e
                    )));
                }
            };

            emit_event(
                &self.event_tx,
                PipelineEvent::TokenGenerated {
                    content: fragment.content.clone(),
                },
            );

            if let Some(text) = self.aggregator.push(&fragment.content) {
                self.send_chunk(text, output)?;
            }
        }

        // Generator exhausted: a reply without terminal punctuation is
        // still spoken in full
        if let Some(text) = self.aggregator.flush() {
            self.send_chunk(text, output)?;
        }
        Ok(())
    }
}
