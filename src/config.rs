use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub ingest: IngestConfig,
    pub audio: AudioConfig,
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Characters that end a spoken sentence.
    pub punctuation: String,
    /// Token fragments accumulated before a chunk is forced out.
    pub max_chunk_tokens: usize,
}

/// Utterance detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Frames transcribing below this word count end the current turn.
    pub min_utterance_words: usize,
}

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub capture_sample_rate: u32,
    pub playback_sample_rate: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            punctuation: defaults::PUNCTUATION.iter().collect(),
            max_chunk_tokens: defaults::MAX_CHUNK_TOKENS,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            min_utterance_words: defaults::MIN_UTTERANCE_WORDS,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            capture_sample_rate: defaults::CAPTURE_SAMPLE_RATE,
            playback_sample_rate: defaults::PLAYBACK_SAMPLE_RATE,
        }
    }
}

impl ChunkingConfig {
    /// Punctuation set as characters, for the chunk policy.
    pub fn punctuation_chars(&self) -> Vec<char> {
        self.punctuation.chars().collect()
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Errors are propagated for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXLOOP_MAX_CHUNK_TOKENS → chunking.max_chunk_tokens
    /// - VOXLOOP_MIN_UTTERANCE_WORDS → ingest.min_utterance_words
    /// - VOXLOOP_SAMPLE_RATE → audio.playback_sample_rate
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("VOXLOOP_MAX_CHUNK_TOKENS")
            && let Ok(tokens) = raw.parse::<usize>()
            && tokens > 0
        {
            self.chunking.max_chunk_tokens = tokens;
        }

        if let Ok(raw) = std::env::var("VOXLOOP_MIN_UTTERANCE_WORDS")
            && let Ok(words) = raw.parse::<usize>()
        {
            self.ingest.min_utterance_words = words;
        }

        if let Ok(raw) = std::env::var("VOXLOOP_SAMPLE_RATE")
            && let Ok(rate) = raw.parse::<u32>()
            && rate > 0
        {
            self.audio.playback_sample_rate = rate;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxloop/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voxloop").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_voxloop_env() {
        remove_env("VOXLOOP_MAX_CHUNK_TOKENS");
        remove_env("VOXLOOP_MIN_UTTERANCE_WORDS");
        remove_env("VOXLOOP_SAMPLE_RATE");
    }

    #[test]
    fn test_default_config_has_expected_values() {
        let config = Config::default();

        assert_eq!(config.chunking.punctuation, ".!?:");
        assert_eq!(config.chunking.max_chunk_tokens, 45);
        assert_eq!(config.ingest.min_utterance_words, 4);
        assert_eq!(config.audio.capture_sample_rate, 16000);
        assert_eq!(config.audio.playback_sample_rate, 24000);
    }

    #[test]
    fn test_punctuation_chars_roundtrip() {
        let config = ChunkingConfig::default();
        assert_eq!(config.punctuation_chars(), vec!['.', '!', '?', ':']);
    }

    #[test]
    fn test_load_complete_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[chunking]
punctuation = ".!?"
max_chunk_tokens = 60

[ingest]
min_utterance_words = 2

[audio]
capture_sample_rate = 8000
playback_sample_rate = 48000
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.chunking.punctuation, ".!?");
        assert_eq!(config.chunking.max_chunk_tokens, 60);
        assert_eq!(config.ingest.min_utterance_words, 2);
        assert_eq!(config.audio.capture_sample_rate, 8000);
        assert_eq!(config.audio.playback_sample_rate, 48000);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[chunking]
max_chunk_tokens = 30
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.chunking.max_chunk_tokens, 30);
        // Everything else falls back to defaults
        assert_eq!(config.chunking.punctuation, ".!?:");
        assert_eq!(config.ingest.min_utterance_words, 4);
        assert_eq!(config.audio.playback_sample_rate, 24000);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chunking = not valid").unwrap();

        let result = Config::load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/voxloop.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[[").unwrap();

        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_voxloop_env();

        set_env("VOXLOOP_MAX_CHUNK_TOKENS", "99");
        set_env("VOXLOOP_MIN_UTTERANCE_WORDS", "1");
        set_env("VOXLOOP_SAMPLE_RATE", "44100");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.chunking.max_chunk_tokens, 99);
        assert_eq!(config.ingest.min_utterance_words, 1);
        assert_eq!(config.audio.playback_sample_rate, 44100);

        clear_voxloop_env();
    }

    #[test]
    fn test_env_overrides_ignore_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_voxloop_env();

        set_env("VOXLOOP_MAX_CHUNK_TOKENS", "zero");
        set_env("VOXLOOP_SAMPLE_RATE", "0");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.chunking.max_chunk_tokens, 45);
        assert_eq!(config.audio.playback_sample_rate, 24000);

        clear_voxloop_env();
    }

    #[test]
    fn test_config_serializes_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, parsed);
    }
}
