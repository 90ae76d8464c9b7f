//! In-memory temporal inverted index: maps time ranges to the tokens
//! observed in them via a stack of layers at increasing granularity,
//! bisected with binary search instead of scanned linearly.

mod layer_store;
mod level;
mod loader;
mod searcher;
mod tokens;
mod vi;

use chrono::{DateTime, Utc};
use error::IndexError;
use tracing::debug;

pub use level::LayerLevel;
pub use loader::Posting;

use layer_store::LayerStore;
use vi::{reject_pre_epoch, virtual_index};

/// A temporal inverted index over a fixed range of granularities.
///
/// An index starts `Empty` and becomes queryable only after a successful
/// [`TemporalIndex::load`] — there is no incremental insert. Loading again
/// atomically replaces the previous contents: a reader never observes a
/// partially-built store, and a failed load leaves the prior one (if any)
/// untouched.
#[derive(Debug)]
pub struct TemporalIndex {
    min_level: LayerLevel,
    max_level: LayerLevel,
    store: Option<LayerStore>,
    last_update: Option<DateTime<Utc>>,
}

impl TemporalIndex {
    /// Creates an empty index active over `[min_level, max_level]`.
    pub fn construct(min_level: LayerLevel, max_level: LayerLevel) -> Result<Self, IndexError> {
        LayerLevel::range(min_level, max_level)?;
        Ok(Self {
            min_level,
            max_level,
            store: None,
            last_update: None,
        })
    }

    /// Creates an empty index active over every granularity.
    pub fn full_range() -> Self {
        Self::construct(LayerLevel::MIN, LayerLevel::MAX)
            .expect("LayerLevel::MIN <= LayerLevel::MAX by construction")
    }

    /// Replaces the index contents with a fresh build over `postings`.
    ///
    /// On success the previous contents (if any) are discarded and
    /// `last_update` advances to the wall-clock time of this call. On
    /// failure the index is left exactly as it was before the call.
    pub fn load(&mut self, postings: &[Posting]) -> Result<(), IndexError> {
        let store = loader::load(postings, self.min_level, self.max_level)?;
        self.last_update = Some(Utc::now());
        self.store = Some(store);
        Ok(())
    }

    /// Returns every distinct token observed in `[t_from, t_to)`.
    ///
    /// Returns an empty vector — never an error — when the index has not
    /// been loaded yet, when the range is empty or inverted (`t_from >=
    /// t_to`), when either endpoint is before the Unix epoch, or when no
    /// posting falls in the range: these are all "nothing to report"
    /// outcomes rather than caller mistakes.
    pub fn get(&self, t_from: DateTime<Utc>, t_to: DateTime<Utc>) -> Vec<String> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        if t_from >= t_to {
            return Vec::new();
        }
        if reject_pre_epoch(t_from).is_err() || reject_pre_epoch(t_to).is_err() {
            return Vec::new();
        }

        let lo = virtual_index(self.min_level.trunc(t_from));
        let hi = virtual_index(self.min_level.trunc(t_to));
        if lo >= hi {
            return Vec::new();
        }

        let mut ids = searcher::search(store, self.max_level, lo, hi);
        ids.sort_unstable_by_key(|id| id.get());
        ids.dedup();

        let tokens: Vec<String> = ids
            .into_iter()
            .map(|id| store.dictionary.resolve(id).to_owned())
            .collect();

        debug!(
            t_from = %t_from,
            t_to = %t_to,
            tokens = tokens.len(),
            "answered range query"
        );
        tokens
    }

    /// Timestamp of the most recent posting in the currently loaded batch,
    /// or `None` if the index has never been loaded.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Identifies the backing store to a host expecting a URI-like handle.
    /// This index is always in-memory, so the value is constant.
    pub fn uri(&self) -> &'static str {
        ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn narrower_range_result_is_a_subset_of_wider_range_result() {
        use std::collections::HashSet;

        let mut index = TemporalIndex::full_range();
        index
            .load(&dataset_s())
            .unwrap();

        let narrow: HashSet<String> = index
            .get(dt(1970, 1, 1, 0, 30, 0), dt(1970, 1, 1, 1, 30, 0))
            .into_iter()
            .collect();
        let wide: HashSet<String> = index
            .get(dt(1970, 1, 1, 0, 0, 0), dt(1970, 1, 1, 5, 0, 0))
            .into_iter()
            .collect();
        assert!(narrow.is_subset(&wide));
    }

    #[test]
    fn repeated_queries_are_idempotent() {
        let mut index = TemporalIndex::full_range();
        index.load(&dataset_s()).unwrap();

        let first = sorted(index.get(dt(1970, 1, 1, 0, 0, 0), dt(1970, 1, 1, 5, 0, 0)));
        let second = sorted(index.get(dt(1970, 1, 1, 0, 0, 0), dt(1970, 1, 1, 5, 0, 0)));
        assert_eq!(first, second);
    }

    #[test]
    fn construct_rejects_inverted_level_range() {
        let err = TemporalIndex::construct(LayerLevel::Day, LayerLevel::Hour).unwrap_err();
        assert!(matches!(err, IndexError::LevelRange { .. }));
    }

    #[test]
    fn unloaded_index_returns_empty_results() {
        let index = TemporalIndex::full_range();
        assert!(index.get(dt(1970, 1, 1, 0, 0, 0), dt(2000, 1, 1, 0, 0, 0)).is_empty());
        assert_eq!(index.last_update(), None);
    }

    #[test]
    fn inverted_query_range_is_empty_without_an_error() {
        let mut index = TemporalIndex::full_range();
        index
            .load(&[Posting::new(dt(1970, 1, 1, 0, 0, 0), vec!["a"])])
            .unwrap();
        assert!(index.get(dt(1980, 1, 1, 0, 0, 0), dt(1970, 1, 1, 0, 0, 0)).is_empty());
    }

    #[test]
    fn pre_epoch_query_endpoint_is_empty_without_panicking() {
        let mut index = TemporalIndex::full_range();
        index
            .load(&[Posting::new(dt(1970, 1, 1, 0, 0, 0), vec!["a"])])
            .unwrap();

        let before_epoch = dt(1969, 12, 31, 23, 59, 59);
        assert!(index.get(before_epoch, dt(1971, 1, 1, 0, 0, 0)).is_empty());
        assert!(index.get(before_epoch, before_epoch + chrono::Duration::seconds(1)).is_empty());
    }

    #[test]
    fn load_then_get_round_trips_through_every_level() {
        let mut index = TemporalIndex::full_range();
        index
            .load(&[
                Posting::new(dt(2020, 3, 10, 8, 0, 0), vec!["alpha"]),
                Posting::new(dt(2020, 3, 10, 8, 30, 0), vec!["beta"]),
                Posting::new(dt(2021, 6, 1, 0, 0, 0), vec!["gamma"]),
            ])
            .unwrap();

        // last_update is the wall-clock time of the load call, not derived
        // from posting timestamps, so only its presence is checked here.
        assert!(index.last_update().is_some());
        assert_eq!(index.uri(), ":memory:");

        let all = sorted(index.get(dt(2020, 1, 1, 0, 0, 0), dt(2022, 1, 1, 0, 0, 0)));
        assert_eq!(all, vec!["alpha", "beta", "gamma"]);

        let just_march = sorted(index.get(dt(2020, 3, 10, 0, 0, 0), dt(2020, 3, 11, 0, 0, 0)));
        assert_eq!(just_march, vec!["alpha", "beta"]);

        let nothing = index.get(dt(2019, 1, 1, 0, 0, 0), dt(2019, 6, 1, 0, 0, 0));
        assert!(nothing.is_empty());
    }

    #[test]
    fn load_failure_leaves_previous_contents_untouched() {
        let mut index = TemporalIndex::full_range();
        index
            .load(&[Posting::new(dt(2020, 1, 1, 0, 0, 0), vec!["kept"])])
            .unwrap();

        let bad = index.load(&[Posting::new(dt(2020, 1, 2, 0, 0, 0), vec![])]);
        assert!(bad.is_err());

        let still_there = index.get(dt(2019, 1, 1, 0, 0, 0), dt(2021, 1, 1, 0, 0, 0));
        assert_eq!(still_there, vec!["kept".to_string()]);
    }

    #[test]
    fn narrower_active_range_still_answers_queries() {
        let mut index = TemporalIndex::construct(LayerLevel::Hour, LayerLevel::Day).unwrap();
        index
            .load(&[
                Posting::new(dt(2020, 5, 1, 10, 15, 0), vec!["x"]),
                Posting::new(dt(2020, 5, 1, 20, 0, 0), vec!["y"]),
            ])
            .unwrap();

        let result = sorted(index.get(dt(2020, 5, 1, 0, 0, 0), dt(2020, 5, 2, 0, 0, 0)));
        assert_eq!(result, vec!["x", "y"]);
    }

    /// Nine postings on 1970-01-01 at 00:00, 00:45, 01:15, 03:00, 03:15,
    /// 03:30, 03:45, 04:00, 04:45 with tokens a..i respectively.
    fn dataset_s() -> Vec<Posting> {
        let times = [
            (0, 0, 0),
            (0, 45, 0),
            (1, 15, 0),
            (3, 0, 0),
            (3, 15, 0),
            (3, 30, 0),
            (3, 45, 0),
            (4, 0, 0),
            (4, 45, 0),
        ];
        "abcdefghi"
            .chars()
            .zip(times)
            .map(|(tok, (h, mi, s))| Posting::new(dt(1970, 1, 1, h, mi, s), vec![tok.to_string()]))
            .collect()
    }

    #[test]
    fn dataset_s_none_to_hour_full_span() {
        let mut index = TemporalIndex::construct(LayerLevel::None, LayerLevel::Hour).unwrap();
        index.load(&dataset_s()).unwrap();

        let result = sorted(index.get(dt(1970, 1, 1, 0, 0, 0), dt(1970, 1, 1, 5, 0, 0)));
        assert_eq!(
            result,
            vec!["a", "b", "c", "d", "e", "f", "g", "h", "i"]
        );
    }

    #[test]
    fn dataset_s_none_to_hour_narrow_window() {
        let mut index = TemporalIndex::construct(LayerLevel::None, LayerLevel::Hour).unwrap();
        index.load(&dataset_s()).unwrap();

        let result = sorted(index.get(dt(1970, 1, 1, 0, 10, 0), dt(1970, 1, 1, 3, 40, 0)));
        assert_eq!(result, vec!["b", "c", "d", "e", "f"]);
    }

    #[test]
    fn dataset_s_none_to_hour_single_token_window() {
        let mut index = TemporalIndex::construct(LayerLevel::None, LayerLevel::Hour).unwrap();
        index.load(&dataset_s()).unwrap();

        let result = sorted(index.get(dt(1970, 1, 1, 0, 40, 0), dt(1970, 1, 1, 0, 50, 0)));
        assert_eq!(result, vec!["b"]);
    }

    #[test]
    fn dataset_s_hour_to_day_loses_precision() {
        let mut index = TemporalIndex::construct(LayerLevel::Hour, LayerLevel::Day).unwrap();
        index.load(&dataset_s()).unwrap();

        // Both endpoints snap to the hour, widening [00:10, 03:40) to
        // [00:00, 03:00) and pulling in everything truncated into that span.
        let result = sorted(index.get(dt(1970, 1, 1, 0, 10, 0), dt(1970, 1, 1, 3, 40, 0)));
        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn dataset_s_hour_to_day_empty_after_truncation() {
        let mut index = TemporalIndex::construct(LayerLevel::Hour, LayerLevel::Day).unwrap();
        index.load(&dataset_s()).unwrap();

        // Both endpoints snap to 00:00, so the window collapses to empty.
        let result = index.get(dt(1970, 1, 1, 0, 40, 0), dt(1970, 1, 1, 0, 50, 0));
        assert!(result.is_empty());
    }

    #[test]
    fn dataset_s_any_inverted_range_is_empty() {
        let mut index = TemporalIndex::construct(LayerLevel::None, LayerLevel::Hour).unwrap();
        index.load(&dataset_s()).unwrap();

        let result = index.get(dt(1970, 1, 1, 3, 0, 0), dt(1970, 1, 1, 1, 0, 0));
        assert!(result.is_empty());
    }

    /// Nine postings, one per month: 1970-01, 02, 03, 04, 07, 09, and
    /// 1971-03, 11, 12, with tokens a..i respectively.
    fn dataset_b() -> Vec<Posting> {
        let months = [
            (1970, 1),
            (1970, 2),
            (1970, 3),
            (1970, 4),
            (1970, 7),
            (1970, 9),
            (1971, 3),
            (1971, 11),
            (1971, 12),
        ];
        "abcdefghi"
            .chars()
            .zip(months)
            .map(|(tok, (y, m))| Posting::new(dt(y, m, 1, 0, 0, 0), vec![tok.to_string()]))
            .collect()
    }

    #[test]
    fn dataset_b_month_to_year_full_span() {
        let mut index = TemporalIndex::construct(LayerLevel::Month, LayerLevel::Year).unwrap();
        index.load(&dataset_b()).unwrap();

        let result = sorted(index.get(dt(1970, 1, 1, 0, 0, 0), dt(1972, 1, 1, 0, 0, 0)));
        assert_eq!(
            result,
            vec!["a", "b", "c", "d", "e", "f", "g", "h", "i"]
        );
    }

    #[test]
    fn dataset_b_day_to_year_straddling_window() {
        let mut index = TemporalIndex::construct(LayerLevel::Day, LayerLevel::Year).unwrap();
        index.load(&dataset_b()).unwrap();

        let result = sorted(index.get(dt(1970, 2, 1, 1, 0, 0), dt(1970, 7, 1, 3, 0, 0)));
        assert_eq!(result, vec!["b", "c", "d"]);
    }

    #[test]
    fn dataset_b_month_to_year_single_bucket() {
        let mut index = TemporalIndex::construct(LayerLevel::Month, LayerLevel::Year).unwrap();
        index.load(&dataset_b()).unwrap();

        let result = sorted(index.get(dt(1970, 2, 1, 0, 0, 0), dt(1970, 3, 1, 0, 0, 0)));
        assert_eq!(result, vec!["b"]);
    }
}
