//! Resampling engines.
//!
//! An [`Engine`] is the single owner of one resampler instance. The converter
//! talks to it through interleaved `f64` frames only; sample format, layout
//! and gain are handled on the converter side, so every backend sees the same
//! stream.
//!
//! Backends:
//!
//! - `rubato`: pure Rust, always available
//! - `soxr`: libsoxr over FFI, behind the `soxr` cargo feature

mod rubato_impl;

#[cfg(feature = "soxr")]
mod ffi;
#[cfg(feature = "soxr")]
mod soxr;

use crate::config::{Backend, ConverterConfig};
use crate::sizing::RateRatio;

/// Engine-side failure, carrying the engine's diagnostic text.
pub type EngineResult<T> = Result<T, String>;

/// A stateful resampler instance.
///
/// Buffers hold interleaved frames of [`Engine::channels`] values. Filter
/// history is kept between calls, so consecutive `process` calls continue
/// one stream.
pub trait Engine: Send {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn channels(&self) -> usize;

    /// Consumes input frames and writes output frames. Returns
    /// `(consumed, produced)` in frames. Consuming fewer frames than offered
    /// only happens when `output` is too small to keep up.
    fn process(&mut self, input: &[f64], output: &mut [f64]) -> EngineResult<(usize, usize)>;

    /// Marks the end of input and writes held-back frames. Returns the
    /// number of frames produced; zero once the engine is empty.
    fn drain(&mut self, output: &mut [f64]) -> EngineResult<usize>;

    /// Output frames the engine currently holds back.
    fn delay(&self) -> f64;

    /// Discards all stream state, keeping the configuration.
    fn reset(&mut self) -> EngineResult<()>;
}

/// Creates the engine selected by `config`.
pub(crate) fn create_engine(
    input_rate: f64,
    output_rate: f64,
    ratio: RateRatio,
    channels: usize,
    config: &ConverterConfig,
) -> EngineResult<Box<dyn Engine>> {
    match config.runtime().backend {
        Backend::Rubato => {
            let engine = rubato_impl::create(ratio, channels, config)?;
            Ok(engine)
        }
        Backend::Soxr => create_soxr(input_rate, output_rate, channels, config),
    }
}

#[cfg(feature = "soxr")]
fn create_soxr(
    input_rate: f64,
    output_rate: f64,
    channels: usize,
    config: &ConverterConfig,
) -> EngineResult<Box<dyn Engine>> {
    let engine = soxr::SoxrEngine::new(input_rate, output_rate, channels, config)?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "soxr"))]
fn create_soxr(
    _input_rate: f64,
    _output_rate: f64,
    _channels: usize,
    _config: &ConverterConfig,
) -> EngineResult<Box<dyn Engine>> {
    Err("soxr backend not compiled in".to_string())
}
