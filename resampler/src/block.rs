//! Bounds-checked views into caller-owned sample buffers.

use crate::error::BlockError;

/// A borrowed run of samples inside a caller buffer.
///
/// Offsets and lengths count samples (array elements), not frames. A
/// two-channel interleaved block of `n` frames has `len() == 2 * n`.
/// The converter reads the block during a call and never keeps it.
///
/// ```
/// use giztoy_resampler::SampleBlock;
///
/// let buf = [1.0f32, 2.0, 3.0, 4.0, 5.0];
/// let block = SampleBlock::new(&buf, 1, 3).unwrap();
/// assert_eq!(block.as_slice(), &[2.0, 3.0, 4.0]);
/// assert!(SampleBlock::new(&buf, 4, 2).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SampleBlock<'a, T> {
    samples: &'a [T],
    offset: usize,
}

impl<'a, T> SampleBlock<'a, T> {
    /// Views `len` samples of `base` starting at `offset`.
    pub fn new(base: &'a [T], offset: usize, len: usize) -> Result<Self, BlockError> {
        let err = BlockError {
            offset,
            len,
            capacity: base.len(),
        };
        let end = offset.checked_add(len).ok_or(err)?;
        let samples = base.get(offset..end).ok_or(err)?;
        Ok(Self { samples, offset })
    }

    /// Views the whole buffer.
    pub fn whole(base: &'a [T]) -> Self {
        Self {
            samples: base,
            offset: 0,
        }
    }

    pub fn empty() -> Self {
        Self {
            samples: &[],
            offset: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Offset of this view in the buffer it was created from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.samples
    }

    /// Drops the first `n` samples, clamping at the end of the view.
    pub fn advance(self, n: usize) -> Self {
        let n = n.min(self.samples.len());
        Self {
            samples: &self.samples[n..],
            offset: self.offset + n,
        }
    }

    /// Splits the buffer into consecutive blocks of at most `size` samples.
    pub fn chunks(base: &'a [T], size: usize) -> impl Iterator<Item = SampleBlock<'a, T>> {
        let size = size.max(1);
        base.chunks(size).enumerate().map(move |(i, samples)| Self {
            samples,
            offset: i * size,
        })
    }
}

impl<'a, T> From<&'a [T]> for SampleBlock<'a, T> {
    fn from(base: &'a [T]) -> Self {
        Self::whole(base)
    }
}

impl<'a, T> From<&'a Vec<T>> for SampleBlock<'a, T> {
    fn from(base: &'a Vec<T>) -> Self {
        Self::whole(base.as_slice())
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for SampleBlock<'a, T> {
    fn from(base: &'a [T; N]) -> Self {
        Self::whole(base.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_bounds() {
        let buf: Vec<i16> = (0..10).collect();
        let block = SampleBlock::new(&buf, 2, 5).unwrap();
        assert_eq!(block.as_slice(), &[2, 3, 4, 5, 6]);
        assert_eq!(block.offset(), 2);

        assert!(SampleBlock::new(&buf, 10, 0).unwrap().is_empty());
        assert_eq!(
            SampleBlock::new(&buf, 8, 3).unwrap_err(),
            BlockError { offset: 8, len: 3, capacity: 10 }
        );
        assert!(SampleBlock::new(&buf, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_block_advance() {
        let buf = [1u8, 2, 3, 4];
        let block = SampleBlock::whole(&buf).advance(3);
        assert_eq!(block.as_slice(), &[4]);
        assert_eq!(block.offset(), 3);
        assert!(block.advance(10).is_empty());
    }

    #[test]
    fn test_block_chunks() {
        let buf: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let chunks: Vec<_> = SampleBlock::chunks(&buf, 20).collect();
        assert_eq!(chunks.len(), 50);
        assert_eq!(chunks[49].offset(), 980);
        assert_eq!(chunks[49].as_slice()[19], 999.0);

        let uneven: Vec<_> = SampleBlock::chunks(&buf[..45], 20).map(|b| b.len()).collect();
        assert_eq!(uneven, vec![20, 20, 5]);
    }
}
