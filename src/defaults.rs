//! Default configuration constants for voxloop.
//!
//! This module provides shared constants used across configuration types
//! and the pipeline controller to ensure consistency.

use std::time::Duration;

/// Sentence-ending punctuation that closes a text chunk.
///
/// A chunk boundary fires when the running buffer ends in one of these,
/// with a carve-out for `.` preceded by a digit (list markers like "3.").
pub const PUNCTUATION: &[char] = &['.', '!', '?', ':'];

/// Maximum token fragments accumulated before a chunk is forced out.
///
/// Fallback boundary so generation that produces no punctuation for a long
/// stretch never starves the synthesizer and player.
pub const MAX_CHUNK_TOKENS: usize = 45;

/// Minimum words a transcribed frame must contain to extend the current turn.
///
/// A frame transcribing below this is taken as the user having stopped
/// speaking, and the accumulated turn is emitted as one utterance.
pub const MIN_UTTERANCE_WORDS: usize = 4;

/// Sample rate of synthesized audio in Hz.
///
/// 24kHz matches common neural TTS model output.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Sample rate of captured audio in Hz.
///
/// 16kHz is the standard input rate for speech recognition models.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Capacity of the captured-frame queue.
pub const FRAME_BUFFER: usize = 32;

/// Capacity of the utterance queue.
pub const UTTERANCE_BUFFER: usize = 8;

/// Capacity of the text-chunk queue.
///
/// Small on purpose: a full queue blocks the generation stage, which is the
/// pipeline's backpressure point while synthesis and playback catch up.
pub const CHUNK_BUFFER: usize = 8;

/// Capacity of the synthesized-audio queue.
pub const AUDIO_BUFFER: usize = 4;

/// How long a stage waits on its input queue before re-checking the
/// shutdown signal.
pub const QUEUE_POLL: Duration = Duration::from_millis(100);

/// Interval between reads of the capture source.
pub const CAPTURE_POLL: Duration = Duration::from_millis(16);

/// Consecutive capture read failures tolerated before the capture loop
/// gives up.
pub const MAX_CONSECUTIVE_CAPTURE_ERRORS: u32 = 10;

/// How long `PipelineHandle::stop` waits for stage threads to finish
/// before detaching them.
pub const SHUTDOWN_JOIN_DEADLINE: Duration = Duration::from_secs(5);
