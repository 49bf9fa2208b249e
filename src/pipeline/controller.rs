//! Pipeline controller: owns stage lifecycle from spawn to join.

use crate::audio::capture::CaptureSource;
use crate::audio::sink::AudioSink;
use crate::chunk::{ChunkAggregator, ChunkPolicy, SpokenTextPolicy};
use crate::config::Config;
use crate::defaults;
use crate::error::{Result, VoxloopError};
use crate::llm::generator::Generator;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::generation::GenerationStage;
use crate::pipeline::ingest::IngestStage;
use crate::pipeline::playback::PlaybackStage;
use crate::pipeline::queue::{StageItem, StageReceiver, StageSender, TrySendError, stage_queue};
use crate::pipeline::signal::ShutdownSignal;
use crate::pipeline::stage::StageRunner;
use crate::pipeline::synthesis::SynthesisStage;
use crate::pipeline::types::{AudioFrame, PipelineEvent, Utterance};
use crate::stt::transcriber::Transcriber;
use crate::tts::synthesizer::Synthesizer;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sentence-ending punctuation for the chunk policy
    pub punctuation: Vec<char>,
    /// Fragment-count fallback boundary
    pub max_chunk_tokens: usize,
    /// Turn-closing word threshold for the ingest stage
    pub min_utterance_words: usize,
    /// Channel buffer sizes
    pub frame_buffer: usize,
    pub utterance_buffer: usize,
    pub chunk_buffer: usize,
    pub audio_buffer: usize,
    /// Optional observer channel for progress events (non-blocking)
    pub event_tx: Option<crossbeam_channel::Sender<PipelineEvent>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            punctuation: defaults::PUNCTUATION.to_vec(),
            max_chunk_tokens: defaults::MAX_CHUNK_TOKENS,
            min_utterance_words: defaults::MIN_UTTERANCE_WORDS,
            frame_buffer: defaults::FRAME_BUFFER,
            utterance_buffer: defaults::UTTERANCE_BUFFER,
            chunk_buffer: defaults::CHUNK_BUFFER,
            audio_buffer: defaults::AUDIO_BUFFER,
            event_tx: None,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            punctuation: config.chunking.punctuation_chars(),
            max_chunk_tokens: config.chunking.max_chunk_tokens,
            min_utterance_words: config.ingest.min_utterance_words,
            ..Default::default()
        }
    }
}

/// Pipeline lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, stages not yet spawned.
    Idle,
    /// All stages spawned and processing.
    Running,
    /// Shutdown requested; stages are finishing in-flight units and
    /// propagating end-of-stream markers.
    Draining,
    /// Every stage has been joined (or detached past the deadline).
    Stopped,
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    shutdown: ShutdownSignal,
    threads: Vec<JoinHandle<()>>,
    state: PipelineState,
}

impl PipelineHandle {
    /// Requests cooperative shutdown without waiting.
    ///
    /// Stages observe the signal at their next unit boundary and propagate
    /// end-of-stream markers downstream; nothing is killed mid-unit. The
    /// external stop trigger (hotkey, signal handler) calls this.
    pub fn request_shutdown(&mut self) {
        if self.state == PipelineState::Running {
            self.shutdown.trigger();
            self.state = PipelineState::Draining;
        }
    }

    /// Stops the pipeline and joins every stage.
    ///
    /// Waits up to the join deadline for threads to finish, surfacing
    /// panics to stderr. Threads still running past the deadline are
    /// detached; they die with the process.
    pub fn stop(mut self) -> PipelineState {
        self.request_shutdown();

        let deadline = Instant::now() + defaults::SHUTDOWN_JOIN_DEADLINE;
        let poll_interval = std::time::Duration::from_millis(50);

        loop {
            // Drain finished threads, joining each to catch panics
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("voxloop: pipeline thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "voxloop: shutdown timeout — {} thread(s) still running, detaching",
                    self.threads.len()
                );
                // Dropping JoinHandles detaches threads; they die with the process.
                self.threads.clear();
                break;
            }

            thread::sleep(poll_interval);
        }

        self.state = PipelineState::Stopped;
        self.state
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Returns true while no shutdown has been requested.
    pub fn is_running(&self) -> bool {
        self.state == PipelineState::Running && !self.shutdown.is_triggered()
    }
}

/// Producer handle for feeding utterances into a responder pipeline.
///
/// The caller owns the upstream: push turns as they arrive and call
/// `finish` (or drop the sender) when the conversation ends so the
/// pipeline drains naturally.
pub struct UtteranceSender {
    tx: StageSender<Utterance>,
    next_sequence: u64,
}

impl UtteranceSender {
    /// Enqueues one user turn, blocking while the pipeline is backed up.
    pub fn send(&mut self, text: impl Into<String>) -> Result<()> {
        let utterance = Utterance::new(text, self.next_sequence);
        self.next_sequence += 1;
        self.tx
            .send(utterance)
            .map_err(|_| VoxloopError::PipelineClosed {
                message: "utterance queue closed".to_string(),
            })
    }

    /// Signals that no further turns will arrive.
    pub fn finish(&mut self) {
        self.tx.finish();
    }
}

/// Speech-to-speech pipeline:
/// capture → ingest → generation → synthesis → playback.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
    policy: Option<Box<dyn ChunkPolicy>>,
}

impl Pipeline {
    /// Creates a new pipeline with the default error reporter and policy.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
            policy: None,
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Sets a custom chunk policy (locale or markup variations).
    pub fn with_policy(mut self, policy: Box<dyn ChunkPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Starts the full conversational loop.
    ///
    /// # Arguments
    /// * `capture` - Audio capture source polled for frames
    /// * `transcriber` - Speech-to-text collaborator
    /// * `generator` - Streaming reply generator
    /// * `synthesizer` - Text-to-speech collaborator
    /// * `sink` - Audio output handler
    ///
    /// # Returns
    /// Handle to control and stop the pipeline
    pub fn start(
        mut self,
        mut capture: Box<dyn CaptureSource>,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn Generator>,
        synthesizer: Arc<dyn Synthesizer>,
        sink: Box<dyn AudioSink>,
    ) -> Result<PipelineHandle> {
        let shutdown = ShutdownSignal::new();

        let (frame_tx, frame_rx) = stage_queue(self.config.frame_buffer);
        let (utterance_tx, utterance_rx) = stage_queue(self.config.utterance_buffer);

        capture.start()?;

        let mut ingest_stage =
            IngestStage::new(transcriber, self.config.min_utterance_words);
        if let Some(ref event_tx) = self.config.event_tx {
            ingest_stage = ingest_stage.with_event_sender(event_tx.clone());
        }

        let ingest_runner = StageRunner::spawn(
            ingest_stage,
            frame_rx,
            utterance_tx,
            shutdown.clone(),
            self.error_reporter.clone(),
        );

        let mut threads =
            self.spawn_reply_stages(utterance_rx, generator, synthesizer, sink, &shutdown);

        threads.push(spawn_capture_loop(capture, frame_tx, shutdown.clone()));
        threads.push(thread::spawn(move || {
            if let Err(msg) = ingest_runner.join() {
                eprintln!("voxloop: {msg}");
            }
        }));

        Ok(PipelineHandle {
            shutdown,
            threads,
            state: PipelineState::Running,
        })
    }

    /// Starts a responder pipeline without the capture/ingest upstream.
    ///
    /// The caller feeds turns through the returned [`UtteranceSender`];
    /// generation, synthesis and playback run exactly as in the full loop.
    pub fn start_responder(
        mut self,
        generator: Arc<dyn Generator>,
        synthesizer: Arc<dyn Synthesizer>,
        sink: Box<dyn AudioSink>,
    ) -> (UtteranceSender, PipelineHandle) {
        let shutdown = ShutdownSignal::new();
        let (utterance_tx, utterance_rx) = stage_queue(self.config.utterance_buffer);

        let threads =
            self.spawn_reply_stages(utterance_rx, generator, synthesizer, sink, &shutdown);

        (
            UtteranceSender {
                tx: utterance_tx,
                next_sequence: 0,
            },
            PipelineHandle {
                shutdown,
                threads,
                state: PipelineState::Running,
            },
        )
    }

    /// Wires generation → synthesis → playback off an utterance queue.
    fn spawn_reply_stages(
        &mut self,
        utterance_rx: StageReceiver<Utterance>,
        generator: Arc<dyn Generator>,
        synthesizer: Arc<dyn Synthesizer>,
        sink: Box<dyn AudioSink>,
        shutdown: &ShutdownSignal,
    ) -> Vec<JoinHandle<()>> {
        let (chunk_tx, chunk_rx) = stage_queue(self.config.chunk_buffer);
        let (audio_tx, audio_rx) = stage_queue(self.config.audio_buffer);
        // Terminal stage: dummy output queue, drained alongside
        let (done_tx, done_rx) = stage_queue::<()>(1);

        let policy = self.policy.take().unwrap_or_else(|| {
            Box::new(SpokenTextPolicy::new(
                self.config.punctuation.clone(),
                self.config.max_chunk_tokens,
            ))
        });

        let mut generation_stage = GenerationStage::new(
            generator,
            ChunkAggregator::new(policy),
            shutdown.clone(),
        );
        let mut synthesis_stage = SynthesisStage::new(synthesizer);
        let mut playback_stage = PlaybackStage::new(sink);

        if let Some(ref event_tx) = self.config.event_tx {
            generation_stage = generation_stage.with_event_sender(event_tx.clone());
            synthesis_stage = synthesis_stage.with_event_sender(event_tx.clone());
            playback_stage = playback_stage.with_event_sender(event_tx.clone());
        }

        let generation_runner = StageRunner::spawn(
            generation_stage,
            utterance_rx,
            chunk_tx,
            shutdown.clone(),
            self.error_reporter.clone(),
        );
        let synthesis_runner = StageRunner::spawn(
            synthesis_stage,
            chunk_rx,
            audio_tx,
            shutdown.clone(),
            self.error_reporter.clone(),
        );
        let playback_runner = StageRunner::spawn(
            playback_stage,
            audio_rx,
            done_tx,
            shutdown.clone(),
            self.error_reporter.clone(),
        );

        // Consume the terminal queue until its end-of-stream marker arrives
        let drain_handle = thread::spawn(move || {
            loop {
                if let StageItem::EndOfStream = done_rx.recv() {
                    break;
                }
            }
        });

        let mut threads = vec![drain_handle];
        threads.push(thread::spawn(move || {
            if let Err(msg) = generation_runner.join() {
                eprintln!("voxloop: {msg}");
            }
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = synthesis_runner.join() {
                eprintln!("voxloop: {msg}");
            }
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = playback_runner.join() {
                eprintln!("voxloop: {msg}");
            }
        }));
        threads
    }
}

/// Polls the capture source and feeds frames to the ingest stage.
///
/// Frames are dropped (not blocked on) when the queue is full: capture is
/// real-time and must not stall behind a slow transcriber. The frame queue
/// is finished on every exit path so downstream stages always see an
/// end-of-stream marker.
fn spawn_capture_loop(
    mut capture: Box<dyn CaptureSource>,
    mut frame_tx: StageSender<AudioFrame>,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut consecutive_errors: u32 = 0;
        let mut sequence: u64 = 0;
        let finite = capture.is_finite();

        while !shutdown.is_triggered() {
            let samples = match capture.read_samples() {
                Ok(samples) => {
                    consecutive_errors = 0;
                    samples
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= defaults::MAX_CONSECUTIVE_CAPTURE_ERRORS {
                        eprintln!(
                            "voxloop: audio capture failed {consecutive_errors} times in a row: {e}"
                        );
                        break;
                    }
                    thread::sleep(defaults::CAPTURE_POLL);
                    continue;
                }
            };

            if samples.is_empty() {
                if finite {
                    // File/script source exhausted; the stream ends here.
                    break;
                }
                // Live source: empty reads are normal while the device
                // warms up. Keep polling.
                thread::sleep(defaults::CAPTURE_POLL);
                continue;
            }

            let frame = AudioFrame::new(samples, sequence);
            sequence += 1;

            match frame_tx.try_send(frame) {
                Ok(()) => {}
                Err(TrySendError::Full) => {
                    // Transcription is behind; this frame is lost
                }
                Err(TrySendError::Closed) => break,
            }

            thread::sleep(defaults::CAPTURE_POLL);
        }

        if let Err(e) = capture.stop() {
            eprintln!("voxloop: failed to stop audio capture: {e}");
        }
        frame_tx.finish();
    })
}
