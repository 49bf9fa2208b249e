//! Speech synthesis collaborator boundary.

pub mod synthesizer;

pub use synthesizer::{AudioSegment, MockSynthesizer, Synthesizer};
