//! `delta` : comme `ultraMinimal`, positions stockées en différences.
//!
//! First entry absolute, every following entry `pos[i] - pos[i-1]`. Repeated
//! small gaps (background texture) compress well downstream.

use ac_core::{ColorLayer, Grid};

use crate::error::CodecError;
use crate::payload::{CodecTag, Decoded, Metadata};
use crate::sparse::{PositionMap, SparseCodec, SparseData, fill};
use crate::traits::{GridDecoder, GridEncoder};

/// Ascending absolute positions → first value plus gaps.
///
/// # Example
/// ```
/// use ac_codec::delta::to_deltas;
/// assert_eq!(to_deltas(&[0, 4, 8]), vec![0, 4, 4]);
/// ```
#[must_use]
pub fn to_deltas(positions: &[usize]) -> Vec<usize> {
    let mut prev = 0;
    positions
        .iter()
        .map(|&pos| {
            let d = pos.saturating_sub(prev);
            prev = pos;
            d
        })
        .collect()
}

/// Prefix sum of deltas. Stops at the first overflow.
///
/// # Example
/// ```
/// use ac_codec::delta::from_deltas;
/// assert_eq!(from_deltas(&[0, 4, 4]), vec![0, 4, 8]);
/// assert_eq!(from_deltas(&[usize::MAX, 1]), vec![usize::MAX]);
/// ```
#[must_use]
pub fn from_deltas(deltas: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(deltas.len());
    let mut acc = 0usize;
    for (i, &d) in deltas.iter().enumerate() {
        acc = if i == 0 {
            d
        } else {
            match acc.checked_add(d) {
                Some(v) => v,
                None => {
                    log::warn!("Débordement delta, {} position(s) ignorée(s)", deltas.len() - i);
                    break;
                }
            }
        };
        out.push(acc);
    }
    out
}

fn map_values(map: &PositionMap, f: fn(&[usize]) -> Vec<usize>) -> PositionMap {
    map.iter().map(|(k, v)| (k.clone(), f(v))).collect()
}

/// Codec `delta`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeltaCodec {
    /// Same color switch as [`SparseCodec`].
    pub sparse: SparseCodec,
}

impl GridEncoder for DeltaCodec {
    const TAG: CodecTag = CodecTag::Delta;
    type Data = SparseData;

    fn encode(&self, grid: &Grid, colors: Option<&ColorLayer>) -> Result<SparseData, CodecError> {
        let absolute = self.sparse.sparse_data(grid, colors)?;
        Ok(SparseData {
            chars: map_values(&absolute.chars, to_deltas),
            colors: absolute.colors.as_ref().map(|p| map_values(p, to_deltas)),
            dims: absolute.dims,
        })
    }
}

impl GridDecoder for DeltaCodec {
    type Data = SparseData;

    fn decode(&self, data: &SparseData, meta: &Metadata) -> Result<Decoded, CodecError> {
        let absolute = SparseData {
            chars: map_values(&data.chars, from_deltas),
            colors: data.colors.as_ref().map(|p| map_values(p, from_deltas)),
            dims: data.dims,
        };
        fill(&absolute, meta)
    }
}
