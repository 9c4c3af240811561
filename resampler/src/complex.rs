//! Complex-valued streams.
//!
//! A complex stream is resampled as two channels holding the real and
//! imaginary parts of each frame. [`ComplexConverter`] wraps a
//! [`Converter`] with that layout and moves [`Complex`] values in and out.

use num_complex::Complex;

use crate::block::SampleBlock;
use crate::config::{ConverterConfig, Layout, SampleFormat};
use crate::converter::{ChannelLayout, Converter, Processed};
use crate::error::{ConfigError, Result};
use crate::sample::Sample;

/// Streaming converter for `Complex<T>` samples, `T` being `f32` or `f64`.
///
/// The config must use interleaved `T` for both input and output.
///
/// ```
/// use giztoy_resampler::{ComplexConverter, ConverterConfig};
/// use num_complex::Complex;
///
/// let mut conv =
///     ComplexConverter::<f32>::new(16000.0, 8000.0, &ConverterConfig::default()).unwrap();
/// let input: Vec<Complex<f32>> = (0..160).map(|i| Complex::new(i as f32, -(i as f32))).collect();
/// let mut out = conv.process(&input).unwrap().samples;
/// out.extend(conv.flush().unwrap().samples);
/// assert_eq!(out.len(), 80);
/// ```
#[derive(Debug)]
pub struct ComplexConverter<T> {
    inner: Converter,
    /// Interleaved (re, im) staging for the current block.
    flat: Vec<T>,
}

impl<T: Sample> ComplexConverter<T> {
    pub fn new(input_rate: f64, output_rate: f64, config: &ConverterConfig) -> Result<Self> {
        let want = SampleFormat {
            datatype: T::DATATYPE,
            layout: Layout::Interleaved,
        };
        if !T::DATATYPE.is_float() || config.io().input != want || config.io().output != want {
            return Err(ConfigError::Unsupported(format!(
                "complex streams need interleaved {:?} in and out, got {:?} -> {:?}",
                T::DATATYPE,
                config.io().input,
                config.io().output
            ))
            .into());
        }

        let inner = Converter::new(input_rate, output_rate, ChannelLayout::Complex, config)?;
        Ok(Self {
            inner,
            flat: Vec::new(),
        })
    }

    /// Converts one block of complex samples.
    pub fn process(&mut self, input: &[Complex<T>]) -> Result<Processed<Complex<T>>> {
        self.flat.clear();
        self.flat.extend(input.iter().flat_map(|c| [c.re, c.im]));
        let out = self.inner.process::<T, T>(SampleBlock::whole(&self.flat))?;
        Ok(pair_up(out))
    }

    /// Drains the samples still held by the engine.
    pub fn flush(&mut self) -> Result<Processed<Complex<T>>> {
        let out = self.inner.flush::<T>()?;
        Ok(pair_up(out))
    }

    pub fn reset(&mut self) -> Result<()> {
        self.inner.reset()
    }

    pub fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    /// The underlying two-channel converter.
    pub fn converter(&self) -> &Converter {
        &self.inner
    }
}

fn pair_up<T: Copy>(out: Processed<T>) -> Processed<Complex<T>> {
    let samples = out
        .samples
        .chunks_exact(2)
        .map(|p| Complex::new(p[0], p[1]))
        .collect();
    Processed {
        progress: out.progress,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataType;
    use crate::error::ResampleError;

    #[test]
    fn test_rejects_non_matching_formats() {
        let config = ConverterConfig::builder()
            .output_format(SampleFormat::interleaved(DataType::I16))
            .build()
            .unwrap();
        let err = ComplexConverter::<f32>::new(16000.0, 8000.0, &config).unwrap_err();
        assert!(matches!(err, ResampleError::Config(ConfigError::Unsupported(_))));

        // Default config is f32, so an f64 converter does not match.
        let err = ComplexConverter::<f64>::new(16000.0, 8000.0, &ConverterConfig::default())
            .unwrap_err();
        assert!(matches!(err, ResampleError::Config(_)));

        let config = ConverterConfig::builder()
            .input_format(SampleFormat::interleaved(DataType::I16))
            .output_format(SampleFormat::interleaved(DataType::I16))
            .build()
            .unwrap();
        assert!(ComplexConverter::<i16>::new(16000.0, 8000.0, &config).is_err());
    }

    #[test]
    fn test_components_resampled_independently() {
        let config = ConverterConfig::builder()
            .input_format(SampleFormat::interleaved(DataType::F64))
            .output_format(SampleFormat::interleaved(DataType::F64))
            .build()
            .unwrap();
        let mut conv = ComplexConverter::<f64>::new(8000.0, 16000.0, &config).unwrap();
        let input = vec![Complex::new(0.5, 0.0); 800];
        let mut out = conv.process(&input).unwrap().samples;
        out.extend(conv.flush().unwrap().samples);
        assert_eq!(out.len(), 1600);
        assert!(out.iter().all(|c| c.im.abs() < 1e-9));
        assert!((out[800].re - 0.5).abs() < 1e-3);
        assert_eq!(conv.converter().total_consumed(), 800);
        conv.close().unwrap();
    }
}
