use std::cmp::Ordering;
use std::time::Duration;

/// Device-clock timestamp in nanoseconds.
///
/// The clock is a modular ring: once it passes `i64::MAX` it continues from
/// `i64::MIN`, and a large negative value that follows a large positive one is
/// the later instant. All arithmetic here wraps instead of overflowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SensorTimestamp(pub i64);

impl SensorTimestamp {
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Signed nanoseconds from `earlier` to `self`.
    ///
    /// `i64::MIN` cannot be negated, so as a subtrahend it is bumped by one first.
    pub fn subtract(self, earlier: SensorTimestamp) -> i64 {
        let mut y = earlier.0;
        if y == i64::MIN {
            y += 1;
        }
        self.0.wrapping_sub(y)
    }

    /// Ring-aware ordering: the sign of [`subtract`](Self::subtract).
    pub fn compare(self, other: SensorTimestamp) -> Ordering {
        self.subtract(other).cmp(&0)
    }

    pub fn offset(self, nanos: i64) -> SensorTimestamp {
        Self(self.0.wrapping_add(nanos))
    }
}

/// Converts an interval into the device timestamp domain, saturating at `i64::MAX`.
pub fn interval_nanos(interval: Duration) -> i64 {
    i64::try_from(interval.as_nanos()).unwrap_or(i64::MAX)
}

pub fn nanos_to_seconds(nanos: i64) -> f64 {
    nanos as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wraps_past_max() {
        let before = SensorTimestamp(i64::MAX - 5);
        let after = before.offset(10);
        assert_eq!(after.0, i64::MIN + 4);
        assert_eq!(after.subtract(before), 10);
        assert_eq!(after.compare(before), Ordering::Greater);
        assert_eq!(before.compare(after), Ordering::Less);
    }

    #[test]
    fn min_value_as_subtrahend() {
        let min = SensorTimestamp(i64::MIN);
        assert_eq!(SensorTimestamp(i64::MIN + 1).subtract(min), 0);
        assert_eq!(SensorTimestamp(i64::MIN + 11).subtract(min), 10);
        assert_eq!(min.compare(min), Ordering::Less);
        assert_eq!(SensorTimestamp(-1).compare(min), Ordering::Greater);
    }

    #[test]
    fn min_value_as_minuend() {
        let min = SensorTimestamp(i64::MIN);
        assert_eq!(min.subtract(SensorTimestamp(i64::MAX)), 1);
        assert_eq!(min.compare(SensorTimestamp(i64::MAX)), Ordering::Greater);
        assert_eq!(SensorTimestamp(i64::MAX).compare(min), Ordering::Less);
    }

    #[test]
    fn interval_conversion() {
        assert_eq!(interval_nanos(Duration::from_millis(100)), 100_000_000);
        assert_eq!(interval_nanos(Duration::MAX), i64::MAX);
        assert_eq!(nanos_to_seconds(100_000_000), 0.1);
    }

    proptest! {
        #[test]
        fn compare_is_antisymmetric(x in (i64::MIN + 1)..=i64::MAX, y in (i64::MIN + 1)..=i64::MAX) {
            let (a, b) = (SensorTimestamp(x), SensorTimestamp(y));
            // The half-ring distance is the one pair whose sign is ambiguous.
            prop_assume!(a.subtract(b) != i64::MIN);
            prop_assert_eq!(a.compare(b), b.compare(a).reverse());
        }

        #[test]
        fn offset_then_subtract_recovers_delta(start in any::<i64>(), delta in 0i64..=i64::MAX / 2) {
            let start = SensorTimestamp(start);
            prop_assume!(start.0 != i64::MIN);
            let later = start.offset(delta);
            prop_assert_eq!(later.subtract(start), delta);
            prop_assert_ne!(later.compare(start), Ordering::Less);
        }
    }
}
