use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use error::IndexError;
use tracing::{debug, info};

use crate::layer_store::{BucketStarts, Layer, LayerStore};
use crate::level::LayerLevel;
use crate::tokens::{TokenDictionary, TokenId};
use crate::vi::{reject_pre_epoch, virtual_index};

/// One input record: a timestamp paired with the tokens observed at it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Posting {
    pub timestamp: DateTime<Utc>,
    pub tokens: Vec<String>,
}

impl Posting {
    pub fn new(timestamp: DateTime<Utc>, tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            timestamp,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

fn validate(postings: &[Posting]) -> Result<(), IndexError> {
    for (index, posting) in postings.iter().enumerate() {
        if posting.tokens.is_empty() {
            return Err(IndexError::MalformedPosting {
                index,
                reason: "empty token list",
            });
        }
        reject_pre_epoch(posting.timestamp)?;
    }
    Ok(())
}

/// Builds a fresh [`LayerStore`] from a batch of postings for every level in
/// `[min_level, max_level]`. The whole batch is validated up front so a
/// rejected batch never leaves a partially-built store behind — the caller
/// only receives the new store once every level has been grouped
/// successfully.
pub(crate) fn load(
    postings: &[Posting],
    min_level: LayerLevel,
    max_level: LayerLevel,
) -> Result<LayerStore, IndexError> {
    let started = Instant::now();
    validate(postings)?;

    let mut dictionary = TokenDictionary::new();
    let interned: Vec<(DateTime<Utc>, Vec<TokenId>)> = postings
        .iter()
        .map(|p| {
            let ids = p.tokens.iter().map(|t| dictionary.intern(t)).collect();
            (p.timestamp, ids)
        })
        .collect();

    let active_levels =
        LayerLevel::range(min_level, max_level).expect("construct() already validated the range");

    let mut layers: [Option<Layer>; 8] = Default::default();
    for &level in active_levels {
        let layer = build_layer(level, &interned);
        debug!(level = ?level, buckets = layer.len(), "built layer");
        layers[level.ordinal() as usize] = Some(layer);
    }

    info!(
        postings = postings.len(),
        levels = active_levels.len(),
        tokens = dictionary.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "loaded temporal index"
    );

    Ok(LayerStore::new(min_level, max_level, layers, dictionary))
}

/// Groups `interned` postings into buckets at `level`, deduplicating both
/// the bucket-start timestamps and the tokens within each bucket.
fn build_layer(level: LayerLevel, interned: &[(DateTime<Utc>, Vec<TokenId>)]) -> Layer {
    // BTreeMap keeps insertion sorted by `vi`, matching starts[L]'s
    // ascending-order invariant without a separate sort pass.
    let mut grouped: BTreeMap<u64, Vec<TokenId>> = BTreeMap::new();

    for (timestamp, ids) in interned {
        let bucket_start = virtual_index(level.trunc(*timestamp));
        let bucket = grouped.entry(bucket_start).or_default();
        for &id in ids {
            if !bucket.contains(&id) {
                bucket.push(id);
            }
        }
    }

    for bucket in grouped.values_mut() {
        bucket.sort_unstable_by_key(|id| id.get());
    }

    let mut starts = Vec::with_capacity(grouped.len());
    let mut postings = Vec::with_capacity(grouped.len());
    for (start, tokens) in grouped {
        starts.push(start);
        postings.push(tokens);
    }

    Layer {
        starts: BucketStarts::from_sorted(starts),
        postings,
    }
}
