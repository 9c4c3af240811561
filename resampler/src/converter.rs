//! Streaming converter session.
//!
//! A [`Converter`] owns one engine for its whole life. Input arrives in
//! blocks of any size; every call returns what the engine produced for it,
//! and [`Converter::flush`] returns what the engine still held back at end
//! of stream. Concatenating all outputs gives the same stream regardless of
//! how the input was split.
//!
//! Lifecycle:
//!
//! ```text
//! new ──> Streaming ──flush──> Draining ──close──> Closed
//!            ^                    │
//!            └───────reset────────┘
//! ```
//!
//! `process` is valid while streaming, `flush` while streaming or draining,
//! and `close` once. Dropping the converter releases the engine as well.
//!
//! # Example
//!
//! ```
//! use giztoy_resampler::{ChannelLayout, Converter, ConverterConfig, SampleBlock};
//!
//! let config = ConverterConfig::default();
//! let mut conv = Converter::new(44100.0, 8000.0, ChannelLayout::Real, &config).unwrap();
//!
//! let input: Vec<f32> = (1..=1000).map(|i| i as f32).collect();
//! let mut output = Vec::new();
//! for block in SampleBlock::chunks(&input, 20) {
//!     let out = conv.process::<f32, f32>(block).unwrap();
//!     output.extend(out.samples);
//! }
//! output.extend(conv.flush::<f32>().unwrap().samples);
//! conv.close().unwrap();
//!
//! assert_eq!(output.len(), 182);
//! ```

use tracing::{debug, trace};

use crate::block::SampleBlock;
use crate::config::{ConverterConfig, DataType, Layout};
use crate::engine::{Engine, create_engine};
use crate::error::{ProcessError, ResampleError, ResourceError, Result};
use crate::sample::Sample;
use crate::sizing::{RateRatio, latency_margin, required_output_capacity};

/// Channel arrangement of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// One real channel.
    #[default]
    Real,
    /// Complex samples as two channels, (re, im) per frame.
    Complex,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Real => 1,
            ChannelLayout::Complex => 2,
        }
    }
}

/// Frames consumed and produced by one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub consumed: usize,
    pub produced: usize,
}

/// Output of one call together with its progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Processed<T> {
    pub progress: Progress,
    /// `progress.produced` frames in the configured output layout.
    pub samples: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Streaming,
    Draining,
}

/// A streaming sample-rate converter.
///
/// Not `Sync`: all operations take `&mut self`. Independent converters share
/// nothing and may live on different threads.
pub struct Converter {
    /// `None` once closed.
    engine: Option<Box<dyn Engine>>,
    config: ConverterConfig,
    layout: ChannelLayout,
    input_rate: f64,
    output_rate: f64,
    ratio: RateRatio,
    state: State,
    total_consumed: u64,
    total_produced: u64,
    clips: u64,
    /// Interleaved engine input for the current call.
    in_buf: Vec<f64>,
    /// Split-layout frames accepted but not yet taken by the engine.
    held: Vec<f64>,
    /// Interleaved engine output for the current call.
    out_buf: Vec<f64>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("engine", &self.engine_name())
            .field("layout", &self.layout)
            .field("input_rate", &self.input_rate)
            .field("output_rate", &self.output_rate)
            .field("state", &self.state)
            .field("total_consumed", &self.total_consumed)
            .field("total_produced", &self.total_produced)
            .finish()
    }
}

impl Converter {
    /// Creates a converter from `input_rate` to `output_rate` Hz.
    ///
    /// Rates must be finite and positive. Engine rejection is reported as
    /// [`ResampleError::Create`] with the engine's message.
    pub fn new(
        input_rate: f64,
        output_rate: f64,
        layout: ChannelLayout,
        config: &ConverterConfig,
    ) -> Result<Self> {
        let ratio = RateRatio::new(input_rate, output_rate)?;
        let engine = create_engine(input_rate, output_rate, ratio, layout.channels(), config)
            .map_err(ResampleError::Create)?;

        debug!(
            "resampler: created {} engine {} -> {} Hz, layout={:?}",
            engine.name(),
            input_rate,
            output_rate,
            layout
        );

        Ok(Self {
            engine: Some(engine),
            config: *config,
            layout,
            input_rate,
            output_rate,
            ratio,
            state: State::Streaming,
            total_consumed: 0,
            total_produced: 0,
            clips: 0,
            in_buf: Vec::new(),
            held: Vec::new(),
            out_buf: Vec::new(),
        })
    }

    /// Converts one block and returns the output it produced.
    ///
    /// The output is sized by [`required_output_capacity`], so a call never
    /// returns more than `ceil(ratio * frames)` frames, and may return fewer
    /// while the engine builds up filter history.
    pub fn process<I: Sample, O: Sample>(&mut self, block: SampleBlock<'_, I>) -> Result<Processed<O>> {
        let ch = self.channels();
        let frames = block.len() / ch;
        let capacity = required_output_capacity(frames, self.ratio);

        let mut samples = vec![O::default(); capacity * ch];
        let progress = self.process_into(block, &mut samples)?;
        samples.truncate(progress.produced * ch);
        Ok(Processed { progress, samples })
    }

    /// Converts one block into a caller buffer.
    ///
    /// Returns how many frames were consumed and written. When `output` is
    /// too small the converter may consume only part of an interleaved
    /// block; call again with the rest. A split block is always consumed
    /// whole: frames the engine cannot take yet stay in the converter and are
    /// fed ahead of the next block, or by [`Converter::flush`]. With a split
    /// output layout the produced frames are written planar at the front of
    /// `output`.
    pub fn process_into<I: Sample, O: Sample>(
        &mut self,
        block: SampleBlock<'_, I>,
        output: &mut [O],
    ) -> Result<Progress> {
        if self.engine.is_none() {
            return Err(ResourceError::Closed.into());
        }
        self.check_formats::<I, O>()?;
        if self.state == State::Draining {
            return Err(ProcessError::Drained.into());
        }
        let ch = self.channels();
        if block.len() % ch != 0 {
            return Err(ProcessError::Misaligned { len: block.len(), channels: ch }.into());
        }

        let io = *self.config.io();
        let offered = block.len() / ch;
        let hold = io.input.layout == Layout::Split;
        self.in_buf.clear();
        if hold {
            self.in_buf.append(&mut self.held);
        }
        decode(block.as_slice(), &mut self.in_buf, ch, io.input.layout);

        let capacity = output.len() / ch;
        self.out_buf.clear();
        self.out_buf.resize(capacity * ch, 0.0);

        let engine = self.engine.as_mut().ok_or(ResourceError::Closed)?;
        let (taken, produced) = engine
            .process(&self.in_buf, &mut self.out_buf)
            .map_err(ProcessError::Engine)?;
        let consumed = if hold {
            self.held.extend_from_slice(&self.in_buf[taken * ch..]);
            offered
        } else {
            taken
        };

        let produced = produced.min(capacity);
        self.clips += encode(
            &self.out_buf[..produced * ch],
            &mut output[..produced * ch],
            ch,
            io.output.layout,
            io.scale,
        );
        self.total_consumed += consumed as u64;
        self.total_produced += produced as u64;

        trace!(
            "resampler: process offered={}, consumed={}, produced={}, capacity={}, held={}",
            offered,
            consumed,
            produced,
            capacity,
            self.held.len() / ch
        );
        Ok(Progress { consumed, produced })
    }

    /// Drains everything the engine still holds.
    ///
    /// Call once at end of stream. Further flushes return no frames, and
    /// `process` fails until [`Converter::reset`].
    pub fn flush<O: Sample>(&mut self) -> Result<Processed<O>> {
        let ch = self.channels();
        let engine = self.engine.as_mut().ok_or(ResourceError::Closed)?;
        check_datatype(self.config.io().output.datatype, O::DATATYPE)?;
        self.state = State::Draining;

        let mut drained: Vec<f64> = Vec::new();
        let held = std::mem::take(&mut self.held);
        let mut rest = &held[..];
        while !rest.is_empty() {
            let capacity = required_output_capacity(rest.len() / ch, self.ratio)
                .max(latency_margin(engine.delay()));
            self.out_buf.clear();
            self.out_buf.resize(capacity * ch, 0.0);
            let (taken, n) = engine
                .process(rest, &mut self.out_buf)
                .map_err(ProcessError::Engine)?;
            if taken == 0 && n == 0 {
                return Err(ProcessError::Engine("engine made no progress".to_string()).into());
            }
            drained.extend_from_slice(&self.out_buf[..n * ch]);
            rest = &rest[taken * ch..];
        }

        loop {
            let margin = latency_margin(engine.delay());
            self.out_buf.clear();
            self.out_buf.resize(margin * ch, 0.0);
            let n = engine.drain(&mut self.out_buf).map_err(ProcessError::Engine)?;
            if n == 0 {
                break;
            }
            drained.extend_from_slice(&self.out_buf[..n * ch]);
        }

        let io = *self.config.io();
        let produced = drained.len() / ch;
        let mut samples = vec![O::default(); drained.len()];
        self.clips += encode(&drained, &mut samples, ch, io.output.layout, io.scale);
        self.total_produced += produced as u64;

        debug!(
            "resampler: flushed {} frames, total consumed={}, produced={}",
            produced, self.total_consumed, self.total_produced
        );
        Ok(Processed {
            progress: Progress { consumed: 0, produced },
            samples,
        })
    }

    /// Releases the engine. A second call fails with
    /// [`ResourceError::AlreadyClosed`].
    pub fn close(&mut self) -> Result<()> {
        let engine = self.engine.take().ok_or(ResourceError::AlreadyClosed)?;
        debug!(
            "resampler: closing {} engine after {} -> {} frames",
            engine.name(),
            self.total_consumed,
            self.total_produced
        );
        drop(engine);
        Ok(())
    }

    /// Discards stream history and starts a fresh stream with the same
    /// configuration. Counters are reset as well.
    pub fn reset(&mut self) -> Result<()> {
        let engine = self.engine.as_mut().ok_or(ResourceError::Closed)?;
        engine.reset().map_err(ProcessError::Engine)?;
        self.held.clear();
        self.state = State::Streaming;
        self.total_consumed = 0;
        self.total_produced = 0;
        self.clips = 0;
        debug!("resampler: reset");
        Ok(())
    }

    /// Output frames the engine currently holds back.
    pub fn delay(&self) -> Result<f64> {
        let engine = self.engine.as_ref().ok_or(ResourceError::Closed)?;
        Ok(engine.delay())
    }

    /// Output samples clipped while converting to an integer format.
    pub fn clips(&self) -> u64 {
        self.clips
    }

    pub fn total_consumed(&self) -> u64 {
        self.total_consumed
    }

    pub fn total_produced(&self) -> u64 {
        self.total_produced
    }

    /// `output_rate / input_rate`.
    pub fn ratio(&self) -> f64 {
        self.ratio.get()
    }

    pub fn input_rate(&self) -> f64 {
        self.input_rate
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    /// Name of the engine backend, `None` once closed.
    pub fn engine_name(&self) -> Option<&'static str> {
        self.engine.as_ref().map(|e| e.name())
    }

    fn check_formats<I: Sample, O: Sample>(&self) -> Result<()> {
        check_datatype(self.config.io().input.datatype, I::DATATYPE)?;
        self.check_output::<O>()
    }

    fn check_output<O: Sample>(&self) -> Result<()> {
        check_datatype(self.config.io().output.datatype, O::DATATYPE)
    }
}

fn check_datatype(expected: DataType, actual: DataType) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProcessError::Format { expected, actual }.into())
    }
}

/// Appends `src` to `dst` as interleaved normalized samples.
fn decode<I: Sample>(src: &[I], dst: &mut Vec<f64>, channels: usize, layout: Layout) {
    match layout {
        Layout::Interleaved => dst.extend(src.iter().map(|s| s.to_f64())),
        Layout::Split => {
            let frames = src.len() / channels;
            let base = dst.len();
            dst.resize(base + src.len(), 0.0);
            for (c, plane) in src.chunks_exact(frames.max(1)).take(channels).enumerate() {
                for (f, s) in plane.iter().enumerate() {
                    dst[base + f * channels + c] = s.to_f64();
                }
            }
        }
    }
}

/// Writes interleaved normalized samples to `dst` in `layout`, applying
/// `scale`. Returns the number of clipped samples.
fn encode<O: Sample>(src: &[f64], dst: &mut [O], channels: usize, layout: Layout, scale: f64) -> u64 {
    let frames = src.len() / channels;
    let mut clips = 0;
    for (i, &v) in src.iter().enumerate() {
        let idx = match layout {
            Layout::Interleaved => i,
            Layout::Split => (i % channels) * frames + i / channels,
        };
        let (s, clipped) = O::from_f64(v * scale);
        dst[idx] = s;
        clips += clipped as u64;
    }
    clips
}

/// Appends `block` (frames in `layout`) to `dst` holding earlier frames of
/// the same stream.
fn append_frames<T: Copy>(dst: &mut Vec<T>, block: &[T], channels: usize, layout: Layout) {
    match layout {
        Layout::Interleaved => dst.extend_from_slice(block),
        Layout::Split => {
            let old = dst.len() / channels;
            let new = block.len() / channels;
            let mut joined = Vec::with_capacity(dst.len() + block.len());
            for c in 0..channels {
                joined.extend_from_slice(&dst[c * old..(c + 1) * old]);
                joined.extend_from_slice(&block[c * new..(c + 1) * new]);
            }
            *dst = joined;
        }
    }
}

/// Converts a complete signal in one call: create, process, flush, close.
///
/// ```
/// use giztoy_resampler::{ChannelLayout, ConverterConfig, oneshot};
///
/// let input = vec![0.0f32; 480];
/// let out: Vec<f32> =
///     oneshot(48000.0, 16000.0, ChannelLayout::Real, &ConverterConfig::default(), &input).unwrap();
/// assert_eq!(out.len(), 160);
/// ```
pub fn oneshot<I: Sample, O: Sample>(
    input_rate: f64,
    output_rate: f64,
    layout: ChannelLayout,
    config: &ConverterConfig,
    input: &[I],
) -> Result<Vec<O>> {
    let mut conv = Converter::new(input_rate, output_rate, layout, config)?;
    let ch = layout.channels();
    let out_layout = config.io().output.layout;

    let mut output = Vec::with_capacity(required_output_capacity(input.len() / ch, conv.ratio) * ch);
    let mut rest = SampleBlock::whole(input);
    while !rest.is_empty() {
        let out = conv.process::<I, O>(rest)?;
        append_frames(&mut output, &out.samples, ch, out_layout);
        if out.progress.consumed == 0 && out.progress.produced == 0 {
            return Err(ProcessError::Engine("engine made no progress".to_string()).into());
        }
        rest = rest.advance(out.progress.consumed * ch);
    }
    let tail = conv.flush::<O>()?;
    append_frames(&mut output, &tail.samples, ch, out_layout);
    conv.close()?;
    Ok(output)
}
