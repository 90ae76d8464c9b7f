use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use error::IndexError;

/// Granularity of a layer in the index, from finest (`None`) to coarsest
/// (`Year`). Declared in ascending order so the derived `Ord` matches the
/// layer hierarchy and `deeper`/`shallower` are ordinal arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LayerLevel {
    None = 0,
    Second = 1,
    Minute = 2,
    Hour = 3,
    Day = 4,
    Month = 5,
    Quarter = 6,
    Year = 7,
}

static_assertions::const_assert_eq!(std::mem::size_of::<LayerLevel>(), 1);

/// All eight levels, ordinal-ascending. Used to iterate an active range.
pub const ALL_LEVELS: [LayerLevel; 8] = [
    LayerLevel::None,
    LayerLevel::Second,
    LayerLevel::Minute,
    LayerLevel::Hour,
    LayerLevel::Day,
    LayerLevel::Month,
    LayerLevel::Quarter,
    LayerLevel::Year,
];

impl LayerLevel {
    pub const MIN: LayerLevel = LayerLevel::None;
    pub const MAX: LayerLevel = LayerLevel::Year;

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        ALL_LEVELS.get(value as usize).copied()
    }

    /// Returns the next finer level, or `None` below `None`.
    pub fn deeper(self) -> Option<Self> {
        self.ordinal().checked_sub(1).and_then(Self::from_ordinal)
    }

    /// Returns the next coarser level, or `None` above `Year`.
    pub fn shallower(self) -> Option<Self> {
        Self::from_ordinal(self.ordinal() + 1)
    }

    /// Returns the inclusive range of levels `[min, max]`, ordinal-ascending.
    pub fn range(min: LayerLevel, max: LayerLevel) -> Result<&'static [LayerLevel], IndexError> {
        if min > max {
            return Err(IndexError::LevelRange {
                min: min.ordinal(),
                max: max.ordinal(),
            });
        }
        Ok(&ALL_LEVELS[min.ordinal() as usize..=max.ordinal() as usize])
    }

    /// Snaps `t` to the start of its bucket at this level. Dispatches through
    /// a fixed table indexed by ordinal rather than a closure or trait object.
    pub fn trunc(self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            LayerLevel::None => t,
            LayerLevel::Second => t
                .with_nanosecond(0)
                .expect("zeroing nanoseconds is always valid"),
            LayerLevel::Minute => t
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .expect("zeroing seconds is always valid"),
            LayerLevel::Hour => t
                .with_minute(0)
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .expect("zeroing minutes is always valid"),
            LayerLevel::Day => t
                .with_hour(0)
                .and_then(|t| t.with_minute(0))
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_nanosecond(0))
                .expect("zeroing hours is always valid"),
            LayerLevel::Month => day_one(t),
            LayerLevel::Quarter => {
                let quarter_month = 1 + 3 * ((t.month() - 1) / 3);
                day_one(t)
                    .with_month(quarter_month)
                    .expect("quarter month in 1..=10")
            }
            LayerLevel::Year => Utc
                .with_ymd_and_hms(t.year(), 1, 1, 0, 0, 0)
                .single()
                .expect("first of year at midnight is always unambiguous"),
        }
    }
}

/// Returns `t` truncated to midnight on the first of its month, as a
/// building block for the `Month`/`Quarter`/`Year` truncations above.
fn day_one(t: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(t.year(), t.month(), 1, 0, 0, 0)
        .single()
        .expect("first of month at midnight is always unambiguous")
}
