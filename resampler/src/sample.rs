//! Sample types accepted at the converter boundary.

use crate::config::DataType;

const I16_SCALE: f64 = 32768.0;
const I32_SCALE: f64 = 2147483648.0;

/// A PCM sample type the converter can read and write.
///
/// Integer samples are normalized so that full scale maps to `[-1, 1)`.
/// Float samples pass through unscaled.
pub trait Sample: Copy + Default + Send + Sync + 'static {
    const DATATYPE: DataType;

    fn to_f64(self) -> f64;

    /// Converts back from the normalized domain. Integer types saturate and
    /// report `true` when the value had to be clipped.
    fn from_f64(value: f64) -> (Self, bool);
}

impl Sample for f32 {
    const DATATYPE: DataType = DataType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> (Self, bool) {
        (value as f32, false)
    }
}

impl Sample for f64 {
    const DATATYPE: DataType = DataType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> (Self, bool) {
        (value, false)
    }
}

impl Sample for i32 {
    const DATATYPE: DataType = DataType::I32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64 / I32_SCALE
    }

    #[inline]
    fn from_f64(value: f64) -> (Self, bool) {
        let scaled = (value * I32_SCALE).round();
        if scaled > i32::MAX as f64 {
            (i32::MAX, true)
        } else if scaled < i32::MIN as f64 {
            (i32::MIN, true)
        } else {
            (scaled as i32, false)
        }
    }
}

impl Sample for i16 {
    const DATATYPE: DataType = DataType::I16;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64 / I16_SCALE
    }

    #[inline]
    fn from_f64(value: f64) -> (Self, bool) {
        let scaled = (value * I16_SCALE).round();
        if scaled > i16::MAX as f64 {
            (i16::MAX, true)
        } else if scaled < i16::MIN as f64 {
            (i16::MIN, true)
        } else {
            (scaled as i16, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_roundtrip_and_clip() {
        for v in [i16::MIN, -1000, 0, 1, 12345, i16::MAX] {
            assert_eq!(i16::from_f64(v.to_f64()), (v, false));
        }
        assert_eq!(i16::from_f64(1.0), (i16::MAX, true));
        assert_eq!(i16::from_f64(-1.5), (i16::MIN, true));
        assert_eq!(i16::from_f64(-1.0), (i16::MIN, false));
    }

    #[test]
    fn test_i32_clip() {
        assert_eq!(i32::from_f64(2.0), (i32::MAX, true));
        assert_eq!(i32::from_f64(-2.0), (i32::MIN, true));
        assert_eq!(i32::from_f64(0.5), (1 << 30, false));
    }

    #[test]
    fn test_float_passthrough() {
        assert_eq!(f32::from_f64(1234.5), (1234.5, false));
        assert_eq!(f64::from_f64(-7.0), (-7.0, false));
        assert_eq!(3.0f32.to_f64(), 3.0);
    }

    #[test]
    fn test_datatype_tags() {
        assert_eq!(<f32 as Sample>::DATATYPE, DataType::F32);
        assert_eq!(<i16 as Sample>::DATATYPE, DataType::I16);
    }
}
