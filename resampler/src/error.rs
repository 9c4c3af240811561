//! Error types for the resampler.

use thiserror::Error;

use crate::config::DataType;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ResampleError>;

/// Top-level error returned by every fallible converter operation.
#[derive(Error, Debug)]
pub enum ResampleError {
    /// An option was invalid before any engine was created.
    #[error("resampler: config error: {0}")]
    Config(#[from] ConfigError),

    /// The engine rejected the creation parameters.
    #[error("resampler: create failed: {0}")]
    Create(String),

    /// Processing or draining failed.
    #[error("resampler: process failed: {0}")]
    Process(#[from] ProcessError),

    /// The session was used after its engine handle was released.
    #[error("resampler: {0}")]
    Resource(#[from] ResourceError),
}

/// Invalid or unsupported configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid sample rate {name}={value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("unknown {field} value {value}")]
    Unknown { field: &'static str, value: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("unsupported combination: {0}")]
    Unsupported(String),

    #[error("yaml: {0}")]
    Yaml(String),
}

/// Failure during `process` or `flush`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    /// Diagnostic text reported by the engine.
    #[error("engine: {0}")]
    Engine(String),

    /// The block's sample type differs from the configured format.
    #[error("sample type mismatch: configured {expected:?}, got {actual:?}")]
    Format { expected: DataType, actual: DataType },

    /// The block length is not a whole number of frames.
    #[error("block of {len} samples is not a multiple of {channels} channels")]
    Misaligned { len: usize, channels: usize },

    /// Input was offered after the stream was flushed.
    #[error("stream already drained; reset before feeding more input")]
    Drained,
}

/// Misuse of the session lifecycle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    #[error("converter is closed")]
    Closed,

    #[error("converter already closed")]
    AlreadyClosed,
}

/// Out-of-range view over a caller buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("block: range {offset}..{offset}+{len} exceeds buffer of {capacity}")]
pub struct BlockError {
    pub offset: usize,
    pub len: usize,
    pub capacity: usize,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e.to_string())
    }
}

impl ResampleError {
    /// Returns true if this error came from lifecycle misuse.
    pub fn is_resource(&self) -> bool {
        matches!(self, ResampleError::Resource(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResampleError::Create("invalid io_ratio".to_string());
        assert_eq!(err.to_string(), "resampler: create failed: invalid io_ratio");

        let err: ResampleError = ResourceError::Closed.into();
        assert!(err.to_string().contains("closed"));
        assert!(err.is_resource());

        let err: ResampleError = ConfigError::InvalidRate { name: "input_rate", value: 0.0 }.into();
        assert!(err.to_string().contains("input_rate=0"));
    }

    #[test]
    fn test_process_error_display() {
        let err = ProcessError::Misaligned { len: 3, channels: 2 };
        assert!(err.to_string().contains("multiple of 2"));

        let err = ProcessError::Format { expected: DataType::F32, actual: DataType::I16 };
        assert!(err.to_string().contains("F32"));
    }

    #[test]
    fn test_block_error_display() {
        let err = BlockError { offset: 10, len: 5, capacity: 12 };
        assert_eq!(err.to_string(), "block: range 10..10+5 exceeds buffer of 12");
    }
}
