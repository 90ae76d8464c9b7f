use crate::layer_store::LayerStore;
use crate::level::LayerLevel;
use crate::tokens::TokenId;
use crate::vi::Vi;

/// Answers `[lo, hi)` at `level`, descending to finer levels only at the two
/// edges of the window. Fully-contained coarse buckets are taken wholesale
/// without descending into them. The result may contain duplicate token ids
/// across different levels; the caller is responsible for deduplication.
pub(crate) fn search(store: &LayerStore, level: LayerLevel, lo: Vi, hi: Vi) -> Vec<TokenId> {
    let layer = store.layer(level);

    let i_from = layer.starts.lower_bound(lo);
    let i_to = layer.starts.lower_bound(hi).wrapping_sub(1);

    if level == store.min_level {
        // i_to may have wrapped to usize::MAX when lower_bound(hi) == 0;
        // the comparison below still yields an empty range in that case.
        let upper = i_to.wrapping_add(1);
        if i_from >= upper || upper > layer.len() {
            return Vec::new();
        }
        return layer.postings[i_from..upper]
            .iter()
            .flat_map(|ids| ids.iter().copied())
            .collect();
    }

    let deeper = level
        .deeper()
        .expect("non-leaf level always has a deeper level while level != min_level");

    if i_from >= i_to || i_to == usize::MAX {
        return search(store, deeper, lo, hi);
    }

    let mut result = search(store, deeper, lo, layer.starts.get(i_from));
    result.extend(
        layer.postings[i_from..i_to]
            .iter()
            .flat_map(|ids| ids.iter().copied()),
    );
    result.extend(search(store, deeper, layer.starts.get(i_to), hi));
    result
}
