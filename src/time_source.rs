//! Clock capability consumed by [`IdGenerator`](crate::IdGenerator).

use chrono::{DateTime, Utc};

/// A trait that defines the minimum system clock interface for [`IdGenerator`].
///
/// The generator calls `now()` while holding its lock, so an implementation is never called
/// concurrently by the same generator. It should be monotonic enough for the generated IDs to be
/// ordered; the generator only detects, and refuses to proceed on, readings that go backwards.
///
/// Any `FnMut() -> DateTime<Utc>` closure is a `TimeSource`, which is convenient for tests:
///
/// ```rust
/// use chrono::{DateTime, Duration};
/// use flaki::IdGenerator;
///
/// let mut now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
/// let g = IdGenerator::builder()
///     .time_source(move || {
///         now += Duration::milliseconds(1);
///         now
///     })
///     .build();
///
/// let a = g.next_valid_id();
/// let b = g.next_valid_id();
/// assert_eq!(b.timestamp(), a.timestamp() + 1);
/// ```
///
/// [`IdGenerator`]: crate::IdGenerator
pub trait TimeSource {
    /// Returns the current instant.
    fn now(&mut self) -> DateTime<Utc>;
}

/// The default [`TimeSource`] that reads the system wall clock.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F: FnMut() -> DateTime<Utc>> TimeSource for F {
    fn now(&mut self) -> DateTime<Utc> {
        self()
    }
}
