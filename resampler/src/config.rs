//! Converter configuration.
//!
//! A [`ConverterConfig`] bundles three immutable specs:
//!
//! - [`QualitySpec`]: precision, phase response, rolloff and engine flags
//! - [`IoSpec`]: input/output sample formats and linear gain
//! - [`RuntimeSpec`]: threading, coefficient interpolation and engine backend
//!
//! Configs are assembled with [`ConverterConfigBuilder`] (in code or from
//! YAML) and only become a `ConverterConfig` after [`ConverterConfigBuilder::build`]
//! validates them. Raw soxr recipe/flag integers are decoded with
//! [`QualitySpec::from_recipe`] and friends; values outside the closed sets are
//! rejected there.
//!
//! # Example
//!
//! ```
//! use giztoy_resampler::config::{ConverterConfig, PhaseResponse, Precision, Rolloff};
//!
//! let config = ConverterConfig::builder()
//!     .precision(Precision::High)
//!     .phase(PhaseResponse::Intermediate)
//!     .rolloff(Rolloff::Medium)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.quality().precision, Precision::High);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound accepted for `num_threads`.
pub const MAX_THREADS: u32 = 64;

// Recipe bits (low byte of the soxr recipe word).
const RECIPE_PRECISION_MASK: u64 = 0x0f;
const RECIPE_PHASE_MASK: u64 = 0x30;
const RECIPE_STEEP: u64 = 0x40;

// Flag bits (second soxr quality argument).
const FLAG_ROLLOFF_MASK: u64 = 0x03;
const FLAG_HI_PREC_CLOCK: u64 = 0x08;
const FLAG_DOUBLE_PRECISION: u64 = 0x10;
const FLAG_VR: u64 = 0x20;
const FLAG_KNOWN: u64 = FLAG_ROLLOFF_MASK | FLAG_HI_PREC_CLOCK | FLAG_DOUBLE_PRECISION | FLAG_VR;

// ---------------------------------------------------------------------------
// Quality
// ---------------------------------------------------------------------------

/// Conversion precision: one of the standard presets or an explicit bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Cubic interpolation, no anti-aliasing filter design.
    Quick,
    /// 16-bit with a large rolloff.
    Low,
    /// 16-bit with a medium rolloff.
    Medium,
    /// 20-bit.
    #[default]
    High,
    /// 28-bit.
    VeryHigh,
    Bits16,
    Bits20,
    Bits24,
    Bits28,
    Bits32,
}

impl Precision {
    /// Soxr recipe code for this precision.
    pub fn recipe(self) -> u64 {
        match self {
            Precision::Quick => 0,
            Precision::Low => 1,
            Precision::Medium => 2,
            Precision::Bits16 => 3,
            Precision::High | Precision::Bits20 => 4,
            Precision::Bits24 => 5,
            Precision::VeryHigh | Precision::Bits28 => 6,
            Precision::Bits32 => 7,
        }
    }

    /// Effective precision in bits. Zero for [`Precision::Quick`].
    pub fn bits(self) -> u32 {
        match self {
            Precision::Quick => 0,
            Precision::Low | Precision::Medium | Precision::Bits16 => 16,
            Precision::High | Precision::Bits20 => 20,
            Precision::Bits24 => 24,
            Precision::VeryHigh | Precision::Bits28 => 28,
            Precision::Bits32 => 32,
        }
    }
}

impl TryFrom<u64> for Precision {
    type Error = ConfigError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Precision::Quick),
            1 => Ok(Precision::Low),
            2 => Ok(Precision::Medium),
            3 => Ok(Precision::Bits16),
            4 => Ok(Precision::High),
            5 => Ok(Precision::Bits24),
            6 => Ok(Precision::VeryHigh),
            7 => Ok(Precision::Bits32),
            other => Err(ConfigError::Unknown {
                field: "precision",
                value: other.to_string(),
            }),
        }
    }
}

/// Filter phase response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseResponse {
    #[default]
    Linear,
    Intermediate,
    Minimum,
}

impl PhaseResponse {
    /// Soxr recipe bits for this phase response.
    pub fn recipe(self) -> u64 {
        match self {
            PhaseResponse::Linear => 0x00,
            PhaseResponse::Intermediate => 0x10,
            PhaseResponse::Minimum => 0x30,
        }
    }

    /// Phase response on the 0 (minimum) to 50 (linear) scale.
    pub fn value(self) -> f64 {
        match self {
            PhaseResponse::Linear => 50.0,
            PhaseResponse::Intermediate => 25.0,
            PhaseResponse::Minimum => 0.0,
        }
    }
}

impl TryFrom<u64> for PhaseResponse {
    type Error = ConfigError;

    fn try_from(bits: u64) -> Result<Self, Self::Error> {
        match bits {
            0x00 => Ok(PhaseResponse::Linear),
            0x10 => Ok(PhaseResponse::Intermediate),
            0x30 => Ok(PhaseResponse::Minimum),
            other => Err(ConfigError::Unknown {
                field: "phase_response",
                value: format!("{:#x}", other),
            }),
        }
    }
}

/// Passband rolloff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rolloff {
    /// At most 0.01 dB.
    #[default]
    Small,
    /// At most 0.35 dB.
    Medium,
    /// Chebyshev bandwidth.
    None,
}

impl Rolloff {
    pub fn flags(self) -> u64 {
        match self {
            Rolloff::Small => 0,
            Rolloff::Medium => 1,
            Rolloff::None => 2,
        }
    }
}

impl TryFrom<u64> for Rolloff {
    type Error = ConfigError;

    fn try_from(bits: u64) -> Result<Self, Self::Error> {
        match bits {
            0 => Ok(Rolloff::Small),
            1 => Ok(Rolloff::Medium),
            2 => Ok(Rolloff::None),
            other => Err(ConfigError::Unknown {
                field: "rolloff",
                value: other.to_string(),
            }),
        }
    }
}

/// Filter quality options.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySpec {
    pub precision: Precision,
    pub phase: PhaseResponse,
    /// Steeper transition band at the cost of a longer filter.
    pub steep: bool,
    pub rolloff: Rolloff,
    /// 0 dB point of the passband relative to Nyquist. Derived from the
    /// precision when unset.
    pub passband_end: Option<f64>,
    /// Start of the stopband relative to Nyquist. Defaults to 1.
    pub stopband_begin: Option<f64>,
    pub high_precision_clock: bool,
    pub double_precision: bool,
    pub variable_rate: bool,
}

impl QualitySpec {
    /// Decodes the soxr `recipe` and `flags` words.
    pub fn from_recipe(recipe: u64, flags: u64) -> Result<Self, ConfigError> {
        let known_recipe = RECIPE_PRECISION_MASK | RECIPE_PHASE_MASK | RECIPE_STEEP;
        if recipe & !known_recipe != 0 {
            return Err(ConfigError::Unknown {
                field: "recipe",
                value: format!("{:#x}", recipe),
            });
        }
        if flags & !FLAG_KNOWN != 0 {
            return Err(ConfigError::Unknown {
                field: "quality flags",
                value: format!("{:#x}", flags),
            });
        }

        Ok(Self {
            precision: Precision::try_from(recipe & RECIPE_PRECISION_MASK)?,
            phase: PhaseResponse::try_from(recipe & RECIPE_PHASE_MASK)?,
            steep: recipe & RECIPE_STEEP != 0,
            rolloff: Rolloff::try_from(flags & FLAG_ROLLOFF_MASK)?,
            passband_end: None,
            stopband_begin: None,
            high_precision_clock: flags & FLAG_HI_PREC_CLOCK != 0,
            double_precision: flags & FLAG_DOUBLE_PRECISION != 0,
            variable_rate: flags & FLAG_VR != 0,
        })
    }

    /// Encodes this spec back to soxr `(recipe, flags)`.
    pub fn to_recipe(&self) -> (u64, u64) {
        let mut recipe = self.precision.recipe() | self.phase.recipe();
        if self.steep {
            recipe |= RECIPE_STEEP;
        }

        let mut flags = self.rolloff.flags();
        if self.high_precision_clock {
            flags |= FLAG_HI_PREC_CLOCK;
        }
        if self.double_precision {
            flags |= FLAG_DOUBLE_PRECISION;
        }
        if self.variable_rate {
            flags |= FLAG_VR;
        }
        (recipe, flags)
    }

    /// Effective passband end.
    pub fn passband_end(&self) -> f64 {
        if let Some(v) = self.passband_end {
            return v;
        }
        let bits = self.precision.bits() as f64;
        match self.precision {
            Precision::Low => 1385.0 / 2048.0,
            Precision::Quick | Precision::Medium => 0.91,
            _ if self.steep => 1.0 - 0.35 / bits,
            _ => 1.0 - 1.74 / bits,
        }
    }

    /// Effective stopband begin.
    pub fn stopband_begin(&self) -> f64 {
        self.stopband_begin.unwrap_or(1.0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let pb = self.passband_end();
        if !(pb > 0.0 && pb < 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "passband_end",
                value: pb.to_string(),
            });
        }
        let sb = self.stopband_begin();
        if !(sb > pb && sb <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "stopband_begin",
                value: sb.to_string(),
            });
        }
        if self.variable_rate && self.phase != PhaseResponse::Linear {
            return Err(ConfigError::Unsupported(format!(
                "variable rate requires linear phase, got {:?}",
                self.phase
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// I/O
// ---------------------------------------------------------------------------

/// Sample datatype at the converter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    F32,
    F64,
    I32,
    I16,
}

impl DataType {
    pub fn code(self) -> u32 {
        match self {
            DataType::F32 => 0,
            DataType::F64 => 1,
            DataType::I32 => 2,
            DataType::I16 => 3,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }
}

/// Arrangement of channels within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Frame-major: `[c0, c1, c0, c1, ...]`.
    #[default]
    Interleaved,
    /// Channel-major: all frames of channel 0, then all frames of channel 1.
    Split,
}

/// A datatype in a given layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleFormat {
    pub datatype: DataType,
    pub layout: Layout,
}

impl SampleFormat {
    pub const fn interleaved(datatype: DataType) -> Self {
        Self { datatype, layout: Layout::Interleaved }
    }

    pub const fn split(datatype: DataType) -> Self {
        Self { datatype, layout: Layout::Split }
    }

    /// Soxr datatype code (`SOXR_FLOAT32_I` .. `SOXR_INT16_S`).
    pub fn code(self) -> u32 {
        let split = match self.layout {
            Layout::Interleaved => 0,
            Layout::Split => 4,
        };
        self.datatype.code() + split
    }
}

impl TryFrom<u32> for SampleFormat {
    type Error = ConfigError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        let datatype = match code & 3 {
            0 => DataType::F32,
            1 => DataType::F64,
            2 => DataType::I32,
            _ => DataType::I16,
        };
        match code {
            0..=3 => Ok(Self::interleaved(datatype)),
            4..=7 => Ok(Self::split(datatype)),
            other => Err(ConfigError::Unknown {
                field: "sample format",
                value: other.to_string(),
            }),
        }
    }
}

/// Input and output sample formats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoSpec {
    pub input: SampleFormat,
    pub output: SampleFormat,
    /// Linear gain applied during conversion.
    pub scale: f64,
}

impl Default for IoSpec {
    fn default() -> Self {
        Self {
            input: SampleFormat::default(),
            output: SampleFormat::default(),
            scale: 1.0,
        }
    }
}

impl IoSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "scale",
                value: self.scale.to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Coefficient interpolation strategy for irrational ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoefInterpolation {
    #[default]
    Auto,
    /// Less CPU, more memory.
    Low,
    /// More CPU, less memory.
    High,
}

impl CoefInterpolation {
    pub fn flags(self) -> u32 {
        match self {
            CoefInterpolation::Auto => 0,
            CoefInterpolation::Low => 2,
            CoefInterpolation::High => 3,
        }
    }
}

impl TryFrom<u32> for CoefInterpolation {
    type Error = ConfigError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            0 => Ok(CoefInterpolation::Auto),
            2 => Ok(CoefInterpolation::Low),
            3 => Ok(CoefInterpolation::High),
            other => Err(ConfigError::Unknown {
                field: "coef_interpolation",
                value: other.to_string(),
            }),
        }
    }
}

/// Resampling engine implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Pure Rust engine built on rubato.
    Rubato,
    /// Native libsoxr (requires the `soxr` feature).
    Soxr,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "soxr") {
            Backend::Soxr
        } else {
            Backend::Rubato
        }
    }
}

/// Runtime options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSpec {
    /// 0 lets the engine decide, 1 is single-threaded.
    pub num_threads: u32,
    pub coef_interpolation: CoefInterpolation,
    pub backend: Backend,
}

impl Default for RuntimeSpec {
    fn default() -> Self {
        Self {
            num_threads: 1,
            coef_interpolation: CoefInterpolation::default(),
            backend: Backend::default(),
        }
    }
}

impl RuntimeSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads > MAX_THREADS {
            return Err(ConfigError::OutOfRange {
                field: "num_threads",
                value: self.num_threads.to_string(),
            });
        }
        if self.backend == Backend::Soxr && !cfg!(feature = "soxr") {
            return Err(ConfigError::Unsupported(
                "soxr backend requires the `soxr` feature".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Validated converter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ConverterConfig {
    quality: QualitySpec,
    io: IoSpec,
    runtime: RuntimeSpec,
}

impl ConverterConfig {
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }

    /// Parses and validates a YAML document.
    ///
    /// ```
    /// use giztoy_resampler::config::{ConverterConfig, DataType, PhaseResponse};
    ///
    /// let config = ConverterConfig::from_yaml(
    ///     "quality:\n  phase: minimum\nio:\n  output:\n    datatype: i16\n",
    /// )
    /// .unwrap();
    /// assert_eq!(config.quality().phase, PhaseResponse::Minimum);
    /// assert_eq!(config.io().output.datatype, DataType::I16);
    /// ```
    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        let builder: ConverterConfigBuilder = serde_yaml::from_str(s)?;
        builder.build()
    }

    pub fn quality(&self) -> &QualitySpec {
        &self.quality
    }

    pub fn io(&self) -> &IoSpec {
        &self.io
    }

    pub fn runtime(&self) -> &RuntimeSpec {
        &self.runtime
    }
}

/// Unvalidated configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfigBuilder {
    pub quality: QualitySpec,
    pub io: IoSpec,
    pub runtime: RuntimeSpec,
}

impl ConverterConfigBuilder {
    pub fn quality(mut self, quality: QualitySpec) -> Self {
        self.quality = quality;
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.quality.precision = precision;
        self
    }

    pub fn phase(mut self, phase: PhaseResponse) -> Self {
        self.quality.phase = phase;
        self
    }

    pub fn steep(mut self, steep: bool) -> Self {
        self.quality.steep = steep;
        self
    }

    pub fn rolloff(mut self, rolloff: Rolloff) -> Self {
        self.quality.rolloff = rolloff;
        self
    }

    pub fn passband_end(mut self, passband_end: f64) -> Self {
        self.quality.passband_end = Some(passband_end);
        self
    }

    pub fn stopband_begin(mut self, stopband_begin: f64) -> Self {
        self.quality.stopband_begin = Some(stopband_begin);
        self
    }

    pub fn high_precision_clock(mut self, enabled: bool) -> Self {
        self.quality.high_precision_clock = enabled;
        self
    }

    pub fn double_precision(mut self, enabled: bool) -> Self {
        self.quality.double_precision = enabled;
        self
    }

    pub fn variable_rate(mut self, enabled: bool) -> Self {
        self.quality.variable_rate = enabled;
        self
    }

    pub fn input_format(mut self, format: SampleFormat) -> Self {
        self.io.input = format;
        self
    }

    pub fn output_format(mut self, format: SampleFormat) -> Self {
        self.io.output = format;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.io.scale = scale;
        self
    }

    pub fn num_threads(mut self, num_threads: u32) -> Self {
        self.runtime.num_threads = num_threads;
        self
    }

    pub fn coef_interpolation(mut self, interp: CoefInterpolation) -> Self {
        self.runtime.coef_interpolation = interp;
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.runtime.backend = backend;
        self
    }

    /// Validates the options and freezes them.
    pub fn build(self) -> Result<ConverterConfig, ConfigError> {
        self.quality.validate()?;
        self.io.validate()?;
        self.runtime.validate()?;
        Ok(ConverterConfig {
            quality: self.quality,
            io: self.io,
            runtime: self.runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConverterConfig::builder().build().unwrap();
        assert_eq!(config, ConverterConfig::default());
        assert_eq!(config.quality().precision, Precision::High);
        assert_eq!(config.io().scale, 1.0);
        assert_eq!(config.runtime().num_threads, 1);
    }

    #[test]
    fn test_recipe_roundtrip_for_wrapper_settings() {
        // intermediate phase + high precision clock + medium rolloff
        let q = QualitySpec::from_recipe(0x10, 0x08 | 0x01).unwrap();
        assert_eq!(q.precision, Precision::Quick);
        assert_eq!(q.phase, PhaseResponse::Intermediate);
        assert_eq!(q.rolloff, Rolloff::Medium);
        assert!(q.high_precision_clock);
        assert!(!q.double_precision);
        assert_eq!(q.to_recipe(), (0x10, 0x09));

        // steep filter, VHQ, double precision
        let q = QualitySpec::from_recipe(0x46, 0x10).unwrap();
        assert_eq!(q.precision, Precision::VeryHigh);
        assert!(q.steep);
        assert!(q.double_precision);
    }

    #[test]
    fn test_from_recipe_rejects_unknown_values() {
        assert!(matches!(
            QualitySpec::from_recipe(8, 0),
            Err(ConfigError::Unknown { field: "precision", .. })
        ));
        // 0x20 is not a defined phase value.
        assert!(matches!(
            QualitySpec::from_recipe(0x20, 0),
            Err(ConfigError::Unknown { field: "phase_response", .. })
        ));
        assert!(matches!(
            QualitySpec::from_recipe(0, 3),
            Err(ConfigError::Unknown { field: "rolloff", .. })
        ));
        assert!(matches!(
            QualitySpec::from_recipe(0, 0x100),
            Err(ConfigError::Unknown { field: "quality flags", .. })
        ));
        assert!(matches!(
            QualitySpec::from_recipe(0x80, 0),
            Err(ConfigError::Unknown { field: "recipe", .. })
        ));
    }

    #[test]
    fn test_coef_interpolation_codes() {
        assert_eq!(CoefInterpolation::try_from(0).unwrap(), CoefInterpolation::Auto);
        assert_eq!(CoefInterpolation::try_from(2).unwrap(), CoefInterpolation::Low);
        assert_eq!(CoefInterpolation::try_from(3).unwrap(), CoefInterpolation::High);
        assert!(CoefInterpolation::try_from(1).is_err());
        assert_eq!(CoefInterpolation::High.flags(), 3);
    }

    #[test]
    fn test_sample_format_codes() {
        for code in 0..8 {
            let fmt = SampleFormat::try_from(code).unwrap();
            assert_eq!(fmt.code(), code);
        }
        assert_eq!(SampleFormat::try_from(5).unwrap(), SampleFormat::split(DataType::F64));
        assert!(SampleFormat::try_from(8).is_err());
    }

    #[test]
    fn test_passband_defaults() {
        let mut q = QualitySpec::default();
        assert!((q.passband_end() - 0.913).abs() < 1e-9);
        q.steep = true;
        assert!(q.passband_end() > 0.98);
        q.precision = Precision::Low;
        assert!((q.passband_end() - 0.67626953125).abs() < 1e-12);
        q.passband_end = Some(0.8);
        assert_eq!(q.passband_end(), 0.8);
        assert_eq!(q.stopband_begin(), 1.0);
    }

    #[test]
    fn test_build_rejects_bad_band_edges() {
        let err = ConverterConfig::builder().passband_end(1.2).build().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "passband_end", .. }));

        let err = ConverterConfig::builder()
            .passband_end(0.9)
            .stopband_begin(0.85)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "stopband_begin", .. }));
    }

    #[test]
    fn test_build_rejects_unsupported_combinations() {
        let err = ConverterConfig::builder().num_threads(MAX_THREADS + 1).build().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "num_threads", .. }));

        let err = ConverterConfig::builder()
            .variable_rate(true)
            .phase(PhaseResponse::Minimum)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Unsupported(_)));

        let err = ConverterConfig::builder().scale(f64::NAN).build().unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "scale", .. }));
    }

    #[cfg(not(feature = "soxr"))]
    #[test]
    fn test_build_rejects_missing_backend() {
        let err = ConverterConfig::builder().backend(Backend::Soxr).build().unwrap_err();
        assert!(matches!(err, ConfigError::Unsupported(_)));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
quality:
  precision: bits24
  phase: intermediate
  rolloff: none
  double_precision: true
io:
  input:
    datatype: i16
  output:
    datatype: f64
    layout: split
  scale: 0.5
runtime:
  num_threads: 0
  coef_interpolation: high
"#;
        let config = ConverterConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.quality().precision, Precision::Bits24);
        assert_eq!(config.quality().rolloff, Rolloff::None);
        assert!(config.quality().double_precision);
        assert_eq!(config.io().input, SampleFormat::interleaved(DataType::I16));
        assert_eq!(config.io().output, SampleFormat::split(DataType::F64));
        assert_eq!(config.io().scale, 0.5);
        assert_eq!(config.runtime().num_threads, 0);
        assert_eq!(config.runtime().coef_interpolation, CoefInterpolation::High);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_variant() {
        let err = ConverterConfig::from_yaml("quality:\n  rolloff: huge\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));

        let err = ConverterConfig::from_yaml("quality:\n  passband_end: 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }
}
