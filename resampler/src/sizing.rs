//! Output buffer sizing.
//!
//! [`required_output_capacity`] is the bound used for every `process` call:
//! a call never produces more than `ceil(ratio * input_frames)` frames.
//! It is not a promise that the engine produces that many; the engine holds
//! samples back for filter history and returns them later or on flush.
//! [`latency_margin`] sizes the buffer for draining what the engine holds.

use crate::error::ConfigError;

/// `output_rate / input_rate`, finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RateRatio(f64);

impl RateRatio {
    /// Validates both rates and returns their ratio.
    pub fn new(input_rate: f64, output_rate: f64) -> Result<Self, ConfigError> {
        check_rate("input_rate", input_rate)?;
        check_rate("output_rate", output_rate)?;

        let ratio = output_rate / input_rate;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "rate ratio",
                value: ratio.to_string(),
            });
        }
        Ok(Self(ratio))
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

/// Output frames to reserve for `input_frames` of input.
#[inline]
pub fn required_output_capacity(input_frames: usize, ratio: RateRatio) -> usize {
    (ratio.0 * input_frames as f64).ceil() as usize
}

/// Output frames to reserve when draining an engine reporting `delay`
/// frames of held-back output.
#[inline]
pub fn latency_margin(delay: f64) -> usize {
    if delay.is_finite() && delay > 0.0 {
        delay.ceil() as usize + 1
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_rejects_invalid_rates() {
        assert!(matches!(
            RateRatio::new(0.0, 8000.0),
            Err(ConfigError::InvalidRate { name: "input_rate", .. })
        ));
        assert!(matches!(
            RateRatio::new(44100.0, -8000.0),
            Err(ConfigError::InvalidRate { name: "output_rate", .. })
        ));
        assert!(RateRatio::new(f64::NAN, 8000.0).is_err());
        assert!(RateRatio::new(44100.0, f64::INFINITY).is_err());
        // Finite rates whose ratio underflows to zero.
        assert!(RateRatio::new(f64::MAX, f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn test_required_output_capacity() {
        let r = RateRatio::new(44100.0, 8000.0).unwrap();
        assert_eq!(required_output_capacity(1000, r), 182);
        assert_eq!(required_output_capacity(20, r), 4);
        assert_eq!(required_output_capacity(0, r), 0);

        let r = RateRatio::new(16000.0, 48000.0).unwrap();
        assert_eq!(required_output_capacity(160, r), 480);

        let r = RateRatio::new(48000.0, 24000.0).unwrap();
        assert_eq!(required_output_capacity(7, r), 4);
    }

    #[test]
    fn test_latency_margin() {
        assert_eq!(latency_margin(0.0), 1);
        assert_eq!(latency_margin(-3.0), 1);
        assert_eq!(latency_margin(f64::NAN), 1);
        assert_eq!(latency_margin(10.2), 12);
        assert_eq!(latency_margin(64.0), 65);
    }
}
