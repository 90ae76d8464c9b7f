use crate::level::LayerLevel;
use crate::tokens::{TokenDictionary, TokenId};
use crate::vi::Vi;

/// Sorted, distinct bucket starts for one layer. Stored in the narrowest
/// width that fits every value, per the "virtual index width" design note:
/// choose `u32` per level when possible, promote to `u64` only when needed.
#[derive(Debug, Clone)]
pub(crate) enum BucketStarts {
    Narrow(Vec<u32>),
    Wide(Vec<u64>),
}

impl BucketStarts {
    /// Builds from an ascending, deduplicated list of `vi` values.
    pub(crate) fn from_sorted(values: Vec<Vi>) -> Self {
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]));
        match values.iter().max() {
            Some(&max) if max <= u32::MAX as u64 => {
                BucketStarts::Narrow(values.into_iter().map(|v| v as u32).collect())
            }
            _ => BucketStarts::Wide(values),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            BucketStarts::Narrow(v) => v.len(),
            BucketStarts::Wide(v) => v.len(),
        }
    }

    pub(crate) fn get(&self, index: usize) -> Vi {
        match self {
            BucketStarts::Narrow(v) => v[index] as Vi,
            BucketStarts::Wide(v) => v[index],
        }
    }

    /// First index whose element is >= `key` ("lower_bound").
    pub(crate) fn lower_bound(&self, key: Vi) -> usize {
        match self {
            BucketStarts::Narrow(v) => {
                let key = if key <= u32::MAX as Vi {
                    key as u32
                } else {
                    return v.len();
                };
                v.partition_point(|&x| x < key)
            }
            BucketStarts::Wide(v) => v.partition_point(|&x| x < key),
        }
    }
}

/// One active granularity's bucket starts paired with their postings lists.
#[derive(Debug, Clone)]
pub(crate) struct Layer {
    pub(crate) starts: BucketStarts,
    pub(crate) postings: Vec<Vec<TokenId>>,
}

impl Layer {
    pub(crate) fn len(&self) -> usize {
        self.starts.len()
    }
}

/// The immutable, fully-built index contents published by a successful load.
#[derive(Debug, Clone)]
pub(crate) struct LayerStore {
    pub(crate) min_level: LayerLevel,
    pub(crate) max_level: LayerLevel,
    layers: [Option<Layer>; 8],
    pub(crate) dictionary: TokenDictionary,
}

impl LayerStore {
    pub(crate) fn new(
        min_level: LayerLevel,
        max_level: LayerLevel,
        layers: [Option<Layer>; 8],
        dictionary: TokenDictionary,
    ) -> Self {
        Self {
            min_level,
            max_level,
            layers,
            dictionary,
        }
    }

    /// Returns the layer at `level`.
    ///
    /// # Panics
    /// Panics if `level` is outside `[min_level, max_level]` — every caller
    /// inside this crate only ever visits levels within that range.
    pub(crate) fn layer(&self, level: LayerLevel) -> &Layer {
        self.layers[level.ordinal() as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("layer {level:?} is not active in this store"))
    }

    pub(crate) fn bucket_count(&self, level: LayerLevel) -> usize {
        self.layers[level.ordinal() as usize]
            .as_ref()
            .map_or(0, Layer::len)
    }
}
