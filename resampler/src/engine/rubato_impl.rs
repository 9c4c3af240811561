//! Rubato-based engine.
//!
//! Rubato resamplers consume fixed-size chunks, while a streaming session may
//! be fed blocks of any length. Input is staged until a full chunk is
//! available, and kernel output is queued until the caller has room for it.
//! Because the kernel always sees the same chunk boundaries, the output does
//! not depend on how the input was split across calls.
//!
//! The kernel's own group delay is trimmed from the front of the stream and
//! the total output is capped at `ceil(ratio * frames_in)`, so the stream
//! lines up with its input and a flushed stream has the expected length.

use std::collections::VecDeque;

use rubato::{
    FastFixedIn, PolynomialDegree, Resampler as RubatoResampler, SincFixedIn,
    SincInterpolationParameters, SincInterpolationType, WindowFunction, calculate_cutoff,
};
use tracing::{debug, trace, warn};

use super::{Engine, EngineResult};
use crate::config::{
    CoefInterpolation, ConverterConfig, PhaseResponse, Precision, QualitySpec, Rolloff,
    RuntimeSpec,
};
use crate::sizing::RateRatio;

/// Frames per kernel chunk. Raised for strong downsampling so every chunk
/// still yields output.
const CHUNK_FRAMES: usize = 1024;

/// Zero chunks that may come back empty while draining before giving up.
const MAX_DRAIN_STALLS: usize = 8;

/// Upper bound on kernel buffers, in frames per channel.
const MAX_KERNEL_FRAMES: usize = 1 << 20;

/// Float type the kernel computes in.
pub(crate) trait KernelSample: rubato::Sample {
    fn from_normalized(value: f64) -> Self;
    fn to_normalized(self) -> f64;
}

impl KernelSample for f32 {
    #[inline]
    fn from_normalized(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_normalized(self) -> f64 {
        self as f64
    }
}

impl KernelSample for f64 {
    #[inline]
    fn from_normalized(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_normalized(self) -> f64 {
        self
    }
}

/// The rubato resampler doing the actual filtering.
enum Kernel<T: KernelSample> {
    /// Polynomial interpolation, used for the quick preset.
    Poly(FastFixedIn<T>),
    /// Windowed sinc.
    Sinc(SincFixedIn<T>),
}

impl<T: KernelSample> Kernel<T> {
    fn process_into_buffer(
        &mut self,
        input: &[Vec<T>],
        output: &mut [Vec<T>],
    ) -> Result<(usize, usize), rubato::ResampleError> {
        match self {
            Kernel::Poly(r) => r.process_into_buffer(input, output, None),
            Kernel::Sinc(r) => r.process_into_buffer(input, output, None),
        }
    }

    fn output_frames_max(&self) -> usize {
        match self {
            Kernel::Poly(r) => r.output_frames_max(),
            Kernel::Sinc(r) => r.output_frames_max(),
        }
    }

    fn output_delay(&self) -> usize {
        match self {
            Kernel::Poly(r) => r.output_delay(),
            Kernel::Sinc(r) => r.output_delay(),
        }
    }

    fn reset(&mut self) {
        match self {
            Kernel::Poly(r) => r.reset(),
            Kernel::Sinc(r) => r.reset(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Kernel::Poly(_) => "polynomial",
            Kernel::Sinc(_) => "sinc",
        }
    }
}

/// Streaming engine over a rubato kernel.
pub(crate) struct RubatoEngine<T: KernelSample> {
    kernel: Kernel<T>,
    channels: usize,
    ratio: f64,
    chunk: usize,
    /// Per-channel input waiting for a full chunk.
    staging: Vec<Vec<T>>,
    staged: usize,
    /// Per-channel kernel output for one chunk.
    scratch: Vec<Vec<T>>,
    /// Interleaved output not yet handed to the caller.
    fifo: VecDeque<f64>,
    /// Leading kernel frames still to discard.
    skip: usize,
    backlog_limit: usize,
    frames_in: u64,
    frames_out: u64,
    ended: bool,
}

/// Creates a rubato engine computing in `f32` or `f64` depending on the
/// requested precision.
pub(crate) fn create(
    ratio: RateRatio,
    channels: usize,
    config: &ConverterConfig,
) -> EngineResult<Box<dyn Engine>> {
    let quality = config.quality();
    let runtime = config.runtime();

    if quality.phase != PhaseResponse::Linear {
        return Err(format!(
            "rubato engine only supports linear phase, got {:?}",
            quality.phase
        ));
    }
    if runtime.num_threads > 1 {
        warn!(
            "rubato engine is single-threaded, ignoring num_threads={}",
            runtime.num_threads
        );
    }

    if quality.double_precision || quality.precision.bits() > 20 {
        Ok(Box::new(RubatoEngine::<f64>::new(ratio, channels, quality, runtime)?))
    } else {
        Ok(Box::new(RubatoEngine::<f32>::new(ratio, channels, quality, runtime)?))
    }
}

impl<T: KernelSample> RubatoEngine<T> {
    fn new(
        ratio: RateRatio,
        channels: usize,
        quality: &QualitySpec,
        runtime: &RuntimeSpec,
    ) -> EngineResult<Self> {
        if channels == 0 {
            return Err("channel count must be positive".to_string());
        }
        let ratio = ratio.get();
        let chunk = chunk_frames(ratio)?;
        let kernel = build_kernel::<T>(ratio, chunk, channels, quality, runtime)?;

        let max_out = kernel.output_frames_max();
        let skip = kernel.output_delay();
        debug!(
            "rubato {} kernel: ratio={:.6}, channels={}, chunk={}, delay={}",
            kernel.kind(),
            ratio,
            channels,
            chunk,
            skip
        );

        Ok(Self {
            kernel,
            channels,
            ratio,
            chunk,
            staging: vec![vec![T::from_normalized(0.0); chunk]; channels],
            staged: 0,
            scratch: vec![vec![T::from_normalized(0.0); max_out]; channels],
            fifo: VecDeque::with_capacity(2 * max_out * channels),
            skip,
            backlog_limit: 4 * max_out,
            frames_in: 0,
            frames_out: 0,
            ended: false,
        })
    }

    /// Frames queued for the caller.
    fn pending(&self) -> usize {
        self.fifo.len() / self.channels
    }

    /// Total output this stream may produce given the input seen so far.
    fn output_bound(&self) -> u64 {
        (self.frames_in as f64 * self.ratio).ceil() as u64
    }

    /// Runs the kernel on the staged chunk and queues its output.
    fn run_chunk(&mut self) -> EngineResult<usize> {
        let (_, produced) = self
            .kernel
            .process_into_buffer(&self.staging, &mut self.scratch)
            .map_err(|e| e.to_string())?;
        self.staged = 0;

        let skip = self.skip.min(produced);
        self.skip -= skip;
        for frame in skip..produced {
            for ch in &self.scratch {
                self.fifo.push_back(ch[frame].to_normalized());
            }
        }
        trace!("rubato chunk: produced={}, trimmed={}", produced, skip);
        Ok(produced - skip)
    }

    /// Zero-fills the rest of the staging chunk and runs it.
    fn pad_and_run(&mut self) -> EngineResult<usize> {
        let zero = T::from_normalized(0.0);
        for ch in &mut self.staging {
            ch[self.staged..].fill(zero);
        }
        self.run_chunk()
    }

    /// Moves queued frames into `output`, never past the stream bound.
    fn emit(&mut self, output: &mut [f64]) -> usize {
        let allowed = self.output_bound().saturating_sub(self.frames_out) as usize;
        let n = self
            .pending()
            .min(output.len() / self.channels)
            .min(allowed);
        for (dst, src) in output.iter_mut().zip(self.fifo.drain(..n * self.channels)) {
            *dst = src;
        }
        self.frames_out += n as u64;
        n
    }
}

impl<T: KernelSample> Engine for RubatoEngine<T> {
    fn name(&self) -> &'static str {
        "rubato"
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn process(&mut self, input: &[f64], output: &mut [f64]) -> EngineResult<(usize, usize)> {
        let ch = self.channels;
        let offered = input.len() / ch;

        let mut produced = self.emit(output);
        let mut consumed = 0;
        while consumed < offered {
            // Stop taking input while the caller is not draining output.
            if self.pending() >= self.backlog_limit {
                break;
            }

            let take = (offered - consumed).min(self.chunk - self.staged);
            let frames = input[consumed * ch..(consumed + take) * ch].chunks_exact(ch);
            for (i, frame) in frames.enumerate() {
                for (c, &s) in frame.iter().enumerate() {
                    self.staging[c][self.staged + i] = T::from_normalized(s);
                }
            }
            self.staged += take;
            consumed += take;
            self.frames_in += take as u64;

            if self.staged == self.chunk {
                self.run_chunk()?;
            }
            produced += self.emit(&mut output[produced * ch..]);
        }
        Ok((consumed, produced))
    }

    fn drain(&mut self, output: &mut [f64]) -> EngineResult<usize> {
        if !self.ended {
            self.ended = true;
            if self.staged > 0 {
                self.pad_and_run()?;
            }
        }

        let mut stalls = 0;
        while (self.pending() as u64 + self.frames_out) < self.output_bound() {
            if self.pad_and_run()? == 0 {
                stalls += 1;
                if stalls > MAX_DRAIN_STALLS {
                    return Err("kernel stalled while draining".to_string());
                }
            }
        }
        Ok(self.emit(output))
    }

    fn delay(&self) -> f64 {
        (self.frames_in as f64 * self.ratio - self.frames_out as f64).max(0.0)
    }

    fn reset(&mut self) -> EngineResult<()> {
        self.kernel.reset();
        self.staged = 0;
        self.fifo.clear();
        self.skip = self.kernel.output_delay();
        self.frames_in = 0;
        self.frames_out = 0;
        self.ended = false;
        Ok(())
    }
}

/// Picks the kernel chunk for `ratio`, refusing ratios whose input or output
/// chunk would exceed [`MAX_KERNEL_FRAMES`].
fn chunk_frames(ratio: f64) -> EngineResult<usize> {
    let chunk = (CHUNK_FRAMES as f64).max((4.0 / ratio).ceil());
    if chunk > MAX_KERNEL_FRAMES as f64 || chunk * ratio > MAX_KERNEL_FRAMES as f64 {
        return Err(format!(
            "rate ratio {ratio} is out of range for the rubato engine"
        ));
    }
    Ok(chunk as usize)
}

fn build_kernel<T: KernelSample>(
    ratio: f64,
    chunk: usize,
    channels: usize,
    quality: &QualitySpec,
    runtime: &RuntimeSpec,
) -> EngineResult<Kernel<T>> {
    if quality.precision == Precision::Quick && !quality.variable_rate {
        let r = FastFixedIn::<T>::new(ratio, 1.0, PolynomialDegree::Cubic, chunk, channels)
            .map_err(|e| e.to_string())?;
        return Ok(Kernel::Poly(r));
    }

    let params = sinc_parameters(quality, runtime);
    let r = SincFixedIn::<T>::new(ratio, 1.0, params, chunk, channels)
        .map_err(|e| e.to_string())?;
    Ok(Kernel::Sinc(r))
}

/// Maps quality and runtime options onto sinc filter parameters.
fn sinc_parameters(quality: &QualitySpec, runtime: &RuntimeSpec) -> SincInterpolationParameters {
    let bits = quality.precision.bits();
    let mut sinc_len = match bits {
        0..=16 => 64,
        17..=20 => 128,
        21..=24 => 192,
        25..=28 => 256,
        _ => 320,
    };
    if quality.steep {
        sinc_len *= 2;
    }

    let window = match quality.rolloff {
        Rolloff::Small => WindowFunction::BlackmanHarris2,
        Rolloff::Medium => WindowFunction::Blackman2,
        Rolloff::None => WindowFunction::Hann2,
    };

    let (interpolation, oversampling_factor) = match runtime.coef_interpolation {
        CoefInterpolation::Low => (SincInterpolationType::Linear, 512),
        CoefInterpolation::High => (SincInterpolationType::Cubic, 64),
        CoefInterpolation::Auto if bits <= 20 => (SincInterpolationType::Linear, 256),
        CoefInterpolation::Auto => (SincInterpolationType::Cubic, 256),
    };

    let band_edge = (quality.passband_end() + quality.stopband_begin()) / 2.0;
    let f_cutoff = (band_edge as f32).min(calculate_cutoff::<f32>(sinc_len, window));

    SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        oversampling_factor,
        interpolation,
        window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(
        input_rate: f64,
        output_rate: f64,
        channels: usize,
        config: &ConverterConfig,
    ) -> Box<dyn Engine> {
        let ratio = RateRatio::new(input_rate, output_rate).unwrap();
        create(ratio, channels, config).unwrap()
    }

    fn run_stream(engine: &mut dyn Engine, input: &[f64], block: usize) -> Vec<f64> {
        let ch = engine.channels();
        let mut out = Vec::new();
        let mut buf = vec![0.0; 8192 * ch];
        for piece in input.chunks(block * ch) {
            let mut rest = piece;
            while !rest.is_empty() {
                let (consumed, produced) = engine.process(rest, &mut buf).unwrap();
                out.extend_from_slice(&buf[..produced * ch]);
                rest = &rest[consumed * ch..];
            }
        }
        loop {
            let n = engine.drain(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n * ch]);
        }
        out
    }

    #[test]
    fn test_flushed_length_matches_ratio() {
        let config = ConverterConfig::default();
        let mut e = engine(44100.0, 8000.0, 1, &config);
        let input: Vec<f64> = (1..=1000).map(|i| i as f64 / 1000.0).collect();
        let out = run_stream(e.as_mut(), &input, 1000);
        assert_eq!(out.len(), 182);
        assert_eq!(e.delay(), 0.0);
    }

    #[test]
    fn test_output_independent_of_block_size() {
        let config = ConverterConfig::default();
        let input: Vec<f64> = (0..3000)
            .map(|i| (i as f64 * 0.01).sin() * 0.5)
            .collect();

        let mut a = engine(16000.0, 48000.0, 2, &config);
        let mut b = engine(16000.0, 48000.0, 2, &config);
        let whole = run_stream(a.as_mut(), &input, 1500);
        let pieces = run_stream(b.as_mut(), &input, 7);
        assert_eq!(whole.len(), 4500 * 2);
        assert_eq!(whole, pieces);
    }

    #[test]
    fn test_process_respects_output_capacity() {
        let config = ConverterConfig::default();
        let mut e = engine(8000.0, 48000.0, 1, &config);
        let input = vec![0.25; 4096];
        let mut out = vec![0.0; 10];
        let (consumed, produced) = e.process(&input, &mut out).unwrap();
        assert!(produced <= 10);
        // Input is still taken until the backlog limit kicks in.
        assert!(consumed > 0);
        assert!(consumed <= input.len());
    }

    #[test]
    fn test_delay_tracks_held_back_output() {
        let config = ConverterConfig::default();
        let mut e = engine(48000.0, 24000.0, 1, &config);
        assert_eq!(e.delay(), 0.0);

        let mut out = vec![0.0; 64];
        let (consumed, produced) = e.process(&[0.1; 100], &mut out).unwrap();
        assert_eq!(consumed, 100);
        assert_eq!(produced, 0);
        assert_eq!(e.delay(), 50.0);
    }

    #[test]
    fn test_reset_restarts_stream() {
        let config = ConverterConfig::default();
        let input: Vec<f64> = (0..2000).map(|i| ((i % 50) as f64 - 25.0) / 25.0).collect();
        let mut e = engine(44100.0, 22050.0, 1, &config);
        let first = run_stream(e.as_mut(), &input, 300);
        e.reset().unwrap();
        assert_eq!(e.delay(), 0.0);
        let second = run_stream(e.as_mut(), &input, 300);
        assert_eq!(first, second);
    }

    #[test]
    fn test_quick_uses_polynomial_kernel() {
        let config = ConverterConfig::builder().precision(Precision::Quick).build().unwrap();
        let mut e = engine(22050.0, 44100.0, 1, &config);
        let out = run_stream(e.as_mut(), &[0.5; 500], 100);
        assert_eq!(out.len(), 1000);
    }

    #[test]
    fn test_sinc_parameters_follow_quality() {
        let runtime = RuntimeSpec::default();
        let mut quality = QualitySpec::default();
        let base = sinc_parameters(&quality, &runtime);
        assert_eq!(base.sinc_len, 128);
        assert!(base.f_cutoff > 0.8 && base.f_cutoff < 1.0);

        quality.steep = true;
        quality.precision = Precision::Bits32;
        assert_eq!(sinc_parameters(&quality, &runtime).sinc_len, 640);

        quality.precision = Precision::Low;
        quality.steep = false;
        let low = sinc_parameters(&quality, &runtime);
        assert!(low.f_cutoff < base.f_cutoff);
    }

    #[test]
    fn test_non_linear_phase_is_rejected() {
        let ratio = RateRatio::new(44100.0, 8000.0).unwrap();
        for phase in [PhaseResponse::Intermediate, PhaseResponse::Minimum] {
            let config = ConverterConfig::builder().phase(phase).build().unwrap();
            let err = create(ratio, 1, &config).err().unwrap();
            assert!(err.contains("linear phase"), "{err}");
        }
    }

    #[test]
    fn test_extreme_ratio_is_rejected() {
        let config = ConverterConfig::default();
        for (i, o) in [(1.0, 1.0e9), (1.0e9, 1.0)] {
            let ratio = RateRatio::new(i, o).unwrap();
            let err = create(ratio, 1, &config).err().unwrap();
            assert!(err.contains("out of range"), "{err}");
        }
        assert_eq!(chunk_frames(1000.0).unwrap(), CHUNK_FRAMES);
        assert_eq!(chunk_frames(1.0 / 512.0).unwrap(), 2048);
    }

    #[test]
    fn test_strong_downsampling_still_drains() {
        let config = ConverterConfig::default();
        let mut e = engine(51200.0, 100.0, 1, &config);
        let out = run_stream(e.as_mut(), &vec![0.0; 5120], 512);
        assert_eq!(out.len(), 10);
    }
}
