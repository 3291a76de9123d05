//! Chunk boundaries as exclusive end indices

use crate::error::{ChunkError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Strictly increasing chunk end indices whose last entry equals the
/// length of the segmented buffer.
///
/// The chunk ranges derived from a cut point set always partition
/// `0..len` with no gaps and no overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct CutPointSet {
    cuts: Vec<usize>,
}

impl CutPointSet {
    /// Validate explicit cut points
    pub fn new(cuts: Vec<usize>) -> Result<Self> {
        let Some(&first) = cuts.first() else {
            return Err(ChunkError::EmptyInput);
        };
        if first == 0 {
            return Err(ChunkError::invalid_argument(
                "first cut point must be greater than 0",
            ));
        }
        if let Some(pair) = cuts.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ChunkError::invalid_argument(format!(
                "cut points must be strictly increasing, found {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { cuts })
    }

    /// One chunk covering `0..len`
    pub fn whole(len: usize) -> Result<Self> {
        Self::new(vec![len])
    }

    /// Build from interior boundaries (starts of the second and later
    /// chunks), appending `len` as the final cut.
    ///
    /// Boundaries at 0, at or beyond `len`, or repeated are dropped so that
    /// every chunk keeps at least one element.
    pub fn from_boundaries(boundaries: impl IntoIterator<Item = usize>, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(ChunkError::EmptyInput);
        }
        let mut cuts: Vec<usize> = boundaries
            .into_iter()
            .filter(|&b| b > 0 && b < len)
            .collect();
        cuts.sort_unstable();
        cuts.dedup();
        cuts.push(len);
        Ok(Self { cuts })
    }

    /// Cut points in order
    pub fn as_slice(&self) -> &[usize] {
        &self.cuts
    }

    /// Number of chunks described
    pub fn chunk_count(&self) -> usize {
        self.cuts.len()
    }

    /// Length of the segmented buffer
    pub fn total_len(&self) -> usize {
        self.cuts.last().copied().unwrap_or(0)
    }

    /// Chunk index ranges in order
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        std::iter::once(0)
            .chain(self.cuts.iter().copied())
            .zip(self.cuts.iter().copied())
            .map(|(start, end)| start..end)
    }

    /// Chunk lengths in order
    pub fn sizes(&self) -> Vec<usize> {
        self.ranges().map(|range| range.len()).collect()
    }

    /// Shift every cut by `offset`, used when a batch starts mid-stream
    pub fn offset_by(&self, offset: usize) -> Vec<usize> {
        self.cuts.iter().map(|cut| cut + offset).collect()
    }
}

impl TryFrom<Vec<usize>> for CutPointSet {
    type Error = ChunkError;

    fn try_from(cuts: Vec<usize>) -> Result<Self> {
        Self::new(cuts)
    }
}

impl From<CutPointSet> for Vec<usize> {
    fn from(set: CutPointSet) -> Self {
        set.cuts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_partition_buffer() {
        let cuts = CutPointSet::new(vec![2, 4, 5]).unwrap();
        let ranges: Vec<_> = cuts.ranges().collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
        assert_eq!(cuts.sizes(), vec![2, 2, 1]);
        assert_eq!(cuts.total_len(), 5);
    }

    #[test]
    fn test_invalid_cut_points() {
        assert_eq!(CutPointSet::new(vec![]), Err(ChunkError::EmptyInput));
        assert!(CutPointSet::new(vec![0, 3]).is_err());
        assert!(CutPointSet::new(vec![3, 3]).is_err());
        assert!(CutPointSet::new(vec![4, 2]).is_err());
    }

    #[test]
    fn test_from_boundaries_drops_degenerate_entries() {
        let cuts = CutPointSet::from_boundaries(vec![0, 3, 3, 1, 7, 9], 7).unwrap();
        assert_eq!(cuts.as_slice(), &[1, 3, 7]);

        let whole = CutPointSet::from_boundaries(Vec::new(), 4).unwrap();
        assert_eq!(whole.as_slice(), &[4]);

        assert_eq!(
            CutPointSet::from_boundaries(vec![1], 0),
            Err(ChunkError::EmptyInput)
        );
    }

    #[test]
    fn test_offset_by() {
        let cuts = CutPointSet::new(vec![2, 5]).unwrap();
        assert_eq!(cuts.offset_by(10), vec![12, 15]);
    }
}
