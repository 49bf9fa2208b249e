use crate::error::{Result, VoxloopError};
use crate::pipeline::types::{TokenFragment, Utterance};
use std::sync::Arc;

/// Lazy, ordered, finite stream of token fragments for one reply.
///
/// Fragments arrive in generation order, one at a time; the stream is not
/// restartable.
pub type TokenStream = Box<dyn Iterator<Item = Result<TokenFragment>> + Send>;

/// Trait for streaming reply generation.
///
/// This trait allows swapping implementations (a real model client vs mock).
pub trait Generator: Send + Sync {
    /// Start generating a reply to the given utterance.
    fn generate(&self, utterance: &Utterance) -> Result<TokenStream>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the generator is ready
    fn is_ready(&self) -> bool;
}

/// Implement Generator for Arc<T> to allow sharing across stages.
impl<T: Generator> Generator for Arc<T> {
    fn generate(&self, utterance: &Utterance) -> Result<TokenStream> {
        (**self).generate(utterance)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock generator for testing.
///
/// Streams a fixed fragment sequence for every utterance; can fail on the
/// initial call or mid-stream at a chosen fragment index.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    model_name: String,
    fragments: Vec<String>,
    should_fail: bool,
    fail_at_fragment: Option<usize>,
}

impl MockGenerator {
    /// Create a new mock generator with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            fragments: Vec::new(),
            should_fail: false,
            fail_at_fragment: None,
        }
    }

    /// Configure the fragment sequence streamed for each utterance
    pub fn with_fragments(mut self, fragments: Vec<&str>) -> Self {
        self.fragments = fragments.into_iter().map(str::to_string).collect();
        self
    }

    /// Configure the mock to fail when generation starts
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the stream to fail at the given fragment index
    pub fn with_failure_at_fragment(mut self, index: usize) -> Self {
        self.fail_at_fragment = Some(index);
        self
    }
}

impl Generator for MockGenerator {
    fn generate(&self, _utterance: &Utterance) -> Result<TokenStream> {
        if self.should_fail {
            return Err(VoxloopError::Generation {
                message: "mock generation failure".to_string(),
            });
        }

        let fail_at = self.fail_at_fragment;
        let stream = self
            .fragments
            .clone()
            .into_iter()
            .enumerate()
            .map(move |(index, content)| {
                if fail_at == Some(index) {
                    Err(VoxloopError::Generation {
                        message: format!("mock stream failure at fragment {}", index),
                    })
                } else {
                    Ok(TokenFragment::new(content))
                }
            });
        Ok(Box::new(stream))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance() -> Utterance {
        Utterance::new("explain special relativity", 0)
    }

    #[test]
    fn test_mock_streams_fragments_in_order() {
        let generator =
            MockGenerator::new("test-model").with_fragments(vec!["It", " is", " relative."]);

        let stream = generator.generate(&utterance()).unwrap();
        let contents: Vec<String> = stream.map(|f| f.unwrap().content).collect();
        assert_eq!(contents, vec!["It", " is", " relative."]);
    }

    #[test]
    fn test_mock_stream_is_repeatable_across_calls() {
        let generator = MockGenerator::new("test-model").with_fragments(vec!["again."]);

        for _ in 0..2 {
            let stream = generator.generate(&utterance()).unwrap();
            assert_eq!(stream.count(), 1);
        }
    }

    #[test]
    fn test_mock_empty_stream() {
        let generator = MockGenerator::new("test-model");
        let mut stream = generator.generate(&utterance()).unwrap();
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_mock_initial_failure() {
        let generator = MockGenerator::new("test-model").with_failure();
        let result = generator.generate(&utterance());
        match result {
            Err(VoxloopError::Generation { message }) => {
                assert_eq!(message, "mock generation failure");
            }
            _ => panic!("Expected Generation error"),
        }
        assert!(!generator.is_ready());
    }

    #[test]
    fn test_mock_mid_stream_failure() {
        let generator = MockGenerator::new("test-model")
            .with_fragments(vec!["ok", "ok", "boom", "never"])
            .with_failure_at_fragment(2);

        let stream = generator.generate(&utterance()).unwrap();
        let results: Vec<Result<TokenFragment>> = stream.collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());
    }

    #[test]
    fn test_trait_is_object_safe() {
        let generator: Box<dyn Generator> =
            Box::new(MockGenerator::new("boxed").with_fragments(vec!["x"]));
        assert_eq!(generator.model_name(), "boxed");
        assert!(generator.is_ready());
    }
}
