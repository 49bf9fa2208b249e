//! Core stage abstraction and runner.

use crate::defaults;
use crate::pipeline::error::{ErrorReporter, StageError};
use crate::pipeline::queue::{StageItem, StageReceiver, StageSender};
use crate::pipeline::signal::ShutdownSignal;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A processing stage in the pipeline.
///
/// Each stage receives input units, processes them, and emits zero or more
/// outputs per unit onto its output queue. Stages run in their own threads
/// and are connected by stage queues.
pub trait Stage: Send + 'static {
    /// The input type this stage receives.
    type Input: Send + 'static;
    /// The output type this stage produces.
    type Output: Send + 'static;

    /// Returns the name of this stage for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Processes a single input unit.
    ///
    /// Emits onto `output` directly; stages like generation produce many
    /// outputs for one input, others produce one or none.
    ///
    /// Returns:
    /// - `Ok(())` - unit handled (including "handled by dropping it")
    /// - `Err(StageError::Recoverable)` - unit abandoned, stage continues
    /// - `Err(StageError::Fatal)` - stage cannot continue; the runner
    ///   forces the shutdown signal so the whole pipeline drains
    fn process(
        &mut self,
        input: Self::Input,
        output: &StageSender<Self::Output>,
    ) -> Result<(), StageError>;

    /// Called once when the input stream ends naturally, before the
    /// end-of-stream marker is forwarded. Not called on shutdown: residual
    /// state is deliberately discarded then.
    fn drain(&mut self, _output: &StageSender<Self::Output>) {}

    /// Called when the stage is shutting down, after the end-of-stream
    /// marker has been forwarded. Override for cleanup.
    fn shutdown(&mut self) {}
}

/// Why the runner's main loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    EndOfStream,
    ShutdownRequested,
    Failed,
}

/// Runs a stage in a dedicated thread.
pub struct StageRunner<S: Stage> {
    /// Handle to the spawned thread.
    handle: Option<JoinHandle<()>>,
    /// Name of the stage (cached for error reporting).
    stage_name: &'static str,
    /// Phantom data to mark the stage type.
    _phantom: PhantomData<S>,
}

impl<S: Stage> StageRunner<S> {
    /// Spawns a stage in a dedicated thread.
    ///
    /// # Arguments
    /// * `stage` - The stage implementation to run
    /// * `input` - Queue to receive inputs from
    /// * `output` - Queue to send outputs to
    /// * `shutdown` - Shared shutdown signal, checked between units
    /// * `error_reporter` - Reporter for handling errors
    pub fn spawn(
        stage: S,
        input: StageReceiver<S::Input>,
        output: StageSender<S::Output>,
        shutdown: ShutdownSignal,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let stage_name = stage.name();

        let handle = thread::spawn(move || {
            Self::run_stage(stage, input, output, shutdown, error_reporter);
        });

        Self {
            handle: Some(handle),
            stage_name,
            _phantom: PhantomData,
        }
    }

    /// Main processing loop for the stage.
    fn run_stage(
        mut stage: S,
        input: StageReceiver<S::Input>,
        mut output: StageSender<S::Output>,
        shutdown: ShutdownSignal,
        error_reporter: Arc<dyn ErrorReporter>,
    ) {
        let stage_name = stage.name();

        let end = loop {
            // Checkpoint: shutdown is observed between units, never mid-unit
            if shutdown.is_triggered() {
                break LoopEnd::ShutdownRequested;
            }

            match input.recv_timeout(defaults::QUEUE_POLL) {
                None => continue,
                Some(StageItem::EndOfStream) => break LoopEnd::EndOfStream,
                Some(StageItem::Item(item)) => match stage.process(item, &output) {
                    Ok(()) => {}
                    Err(error @ StageError::Recoverable(_)) => {
                        // Report but continue with the next unit
                        error_reporter.report(stage_name, &error);
                    }
                    Err(error @ StageError::Fatal(_)) => {
                        // During an ongoing shutdown a closed output queue is
                        // expected; only a fresh failure gets reported and
                        // escalated to the whole pipeline.
                        if !shutdown.is_triggered() {
                            error_reporter.report(stage_name, &error);
                            shutdown.trigger();
                        }
                        break LoopEnd::Failed;
                    }
                },
            }
        };

        if end == LoopEnd::EndOfStream {
            stage.drain(&output);
        }

        // Always propagated, exactly once, so downstream stages terminate
        output.finish();
        stage.shutdown();
    }

    /// Waits for the stage thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Stage '{}' thread panicked", self.stage_name))
        } else {
            Ok(())
        }
    }

    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        self.stage_name
    }
}
