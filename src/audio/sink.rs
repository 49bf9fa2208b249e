//! Playback sinks: where finished audio chunks go.

use crate::error::Result;
use crate::pipeline::types::AudioChunk;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Pluggable audio output handler for the playback stage.
///
/// `play` must block until the chunk has been fully played (or otherwise
/// consumed); that blocking is what serializes playback and gives the
/// pipeline its ordering guarantee.
pub trait AudioSink: Send + 'static {
    /// Play one chunk to completion.
    fn play(&mut self, chunk: &AudioChunk) -> Result<()>;

    /// Called on pipeline shutdown after the last chunk.
    fn finish(&mut self) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Collects chunks for tests and library use.
///
/// The shared handle from [`CollectorSink::collected`] stays valid after
/// the sink has been moved into the pipeline.
pub struct CollectorSink {
    chunks: Arc<Mutex<Vec<AudioChunk>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            chunks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle onto everything played so far.
    pub fn collected(&self) -> Arc<Mutex<Vec<AudioChunk>>> {
        self.chunks.clone()
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for CollectorSink {
    fn play(&mut self, chunk: &AudioChunk) -> Result<()> {
        match self.chunks.lock() {
            Ok(mut chunks) => {
                chunks.push(chunk.clone());
                Ok(())
            }
            Err(_) => Err(crate::error::VoxloopError::Playback {
                message: "collector state poisoned".to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Writes all played audio into a single WAV file.
///
/// Chunks are appended in playback order; `finish` finalizes the header.
pub struct WavFileSink {
    writer: Option<hound::WavWriter<std::io::BufWriter<std::fs::File>>>,
}

impl WavFileSink {
    /// Creates the output file up front so path errors surface at
    /// construction, not mid-pipeline.
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl AudioSink for WavFileSink {
    fn play(&mut self, chunk: &AudioChunk) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            for sample in &chunk.samples {
                writer.write_sample(*sample)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        if let Some(writer) = self.writer.take()
            && let Err(e) = writer.finalize()
        {
            eprintln!("voxloop: failed to finalize wav output: {e}");
        }
    }

    fn name(&self) -> &'static str {
        "wav-file"
    }
}

/// Plays chunks through the default output device.
///
/// Opens a fresh output stream per chunk and blocks until playback ends,
/// which keeps the sink `Send` (the underlying device stream is not).
#[cfg(feature = "playback")]
pub struct RodioSink;

#[cfg(feature = "playback")]
impl AudioSink for RodioSink {
    fn play(&mut self, chunk: &AudioChunk) -> Result<()> {
        let stream = rodio::OutputStreamBuilder::open_default_stream().map_err(|e| {
            crate::error::VoxloopError::Playback {
                message: format!("failed to open output stream: {e}"),
            }
        })?;
        let sink = rodio::Sink::connect_new(stream.mixer());
        sink.append(rodio::buffer::SamplesBuffer::new(
            1,
            chunk.sample_rate,
            chunk.samples.clone(),
        ));
        sink.sleep_until_end();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "speaker"
    }
}
