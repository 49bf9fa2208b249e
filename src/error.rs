//! Error types for voxloop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxloopError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Transcription errors
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // Reply generation errors
    #[error("Generation failed: {message}")]
    Generation { message: String },

    // Speech synthesis errors
    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    // Playback errors
    #[error("Playback failed: {message}")]
    Playback { message: String },

    #[error("Audio file error: {0}")]
    Wav(#[from] hound::Error),

    // Pipeline lifecycle errors
    #[error("Pipeline closed: {message}")]
    PipelineClosed { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxloopError>;
