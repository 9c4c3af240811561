//! Streaming sample-rate conversion.
//!
//! This crate converts real or complex sample streams between arbitrary
//! rates, one block at a time:
//!
//! - `config`: quality, I/O and runtime options, built in code or from YAML
//! - `converter`: the streaming session ([`Converter`]) and [`oneshot`]
//! - `complex`: [`ComplexConverter`] for `num_complex::Complex` streams
//! - `sizing`: output buffer sizing rules
//! - `engine`: resampling backends (rubato, or libsoxr with the `soxr` feature)
//!
//! # Example
//!
//! ```rust
//! use giztoy_resampler::{ChannelLayout, Converter, ConverterConfig, SampleBlock};
//! use giztoy_resampler::config::{PhaseResponse, Rolloff};
//!
//! let config = ConverterConfig::builder()
//!     .phase(PhaseResponse::Linear)
//!     .rolloff(Rolloff::Medium)
//!     .build()
//!     .unwrap();
//!
//! let mut conv = Converter::new(48000.0, 16000.0, ChannelLayout::Real, &config).unwrap();
//!
//! // 10ms blocks of silence
//! let input = vec![0.0f32; 4800];
//! let mut output = Vec::new();
//! for block in SampleBlock::chunks(&input, 480) {
//!     output.extend(conv.process::<f32, f32>(block).unwrap().samples);
//! }
//! output.extend(conv.flush::<f32>().unwrap().samples);
//! assert_eq!(output.len(), 1600);
//! ```

pub mod block;
pub mod complex;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod sample;
pub mod sizing;

pub use block::SampleBlock;
pub use complex::ComplexConverter;
pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use converter::{ChannelLayout, Converter, Processed, Progress, oneshot};
pub use error::{
    BlockError, ConfigError, ProcessError, ResampleError, ResourceError, Result,
};
pub use sample::Sample;
pub use sizing::{RateRatio, latency_margin, required_output_capacity};
