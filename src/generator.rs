//! ID generator and related types.

use std::{fmt, iter::FusedIterator, sync};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use crate::id::{MAX_COMPONENT_ID, MAX_NODE_ID, MAX_SEQUENCE, MAX_TIMESTAMP};
use crate::{ClockRegressionError, Config, ConfigError, Id, StdSystemTime, TimeSource};


/// Default start epoch, 2017-01-01T00:00:00Z, in Unix milliseconds.
pub(crate) const DEFAULT_START_EPOCH_MS: i64 = 1_483_228_800_000;

/// Earliest accepted start epoch, 1970-01-01T00:00:00Z, in Unix seconds.
const MIN_START_EPOCH_SECS: i64 = 0;

/// Latest accepted start epoch, 2262-01-01T00:00:00Z, in Unix seconds. Elapsed nanoseconds since
/// any epoch in range fit an `i64`.
const MAX_START_EPOCH_SECS: i64 = 9_214_646_400;

/// Represents a 64-bit ID generator that encapsulates a sequence counter and guarantees the
/// uniqueness and monotonic order of IDs generated by the same instance.
///
/// An instance is identified by a component ID (5 bits) and a node ID (2 bits) embedded in every
/// ID it generates. Instances running concurrently must be given distinct `(component ID, node
/// ID)` pairs; nothing checks this.
///
/// All methods take `&self` and serialize on an internal lock, so a generator can be shared
/// between threads by reference or through an [`Arc`](std::sync::Arc):
///
/// ```rust
/// use std::{sync, thread};
/// use flaki::IdGenerator;
///
/// let g = sync::Arc::new(IdGenerator::builder().component_id(3)?.node_id(1)?.build());
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = sync::Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.next_valid_id(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// # Ok::<(), flaki::ConfigError>(())
/// ```
///
/// # Generator functions
///
/// | Method                     | Returns  | On clock regression       |
/// | -------------------------- | -------- | ------------------------- |
/// | [`next_id`]                | `Id`     | Returns `Err`             |
/// | [`next_id_string`]         | `String` | Returns `Err`             |
/// | [`next_valid_id`]          | `Id`     | Spins until clock catches |
/// | [`next_valid_id_string`]   | `String` | Spins until clock catches |
///
/// When more than 32768 IDs are requested within one millisecond, every method waits (spinning,
/// with the lock held) until the time source reports the next millisecond.
///
/// [`next_id`]: IdGenerator::next_id
/// [`next_id_string`]: IdGenerator::next_id_string
/// [`next_valid_id`]: IdGenerator::next_valid_id
/// [`next_valid_id_string`]: IdGenerator::next_valid_id_string
pub struct IdGenerator<T = StdSystemTime> {
    component_id: u8,
    node_id: u8,
    start_epoch: DateTime<Utc>,

    /// `start_epoch` in Unix milliseconds.
    epoch_ms: i64,

    state: sync::Mutex<State<T>>,
}

/// Mutable part of the generator, only touched with the lock held.
struct State<T> {
    /// Elapsed milliseconds of the last generated ID, or -1 before the first one.
    last_timestamp: i64,
    sequence: u16,
    time_source: T,
}

impl<T: TimeSource> State<T> {
    fn elapsed_ms(&mut self, epoch_ms: i64) -> i64 {
        self.time_source.now().timestamp_millis() - epoch_ms
    }

    /// Busy-polls the time source until it passes `last_timestamp`.
    fn til_next_millis(&mut self, last_timestamp: i64, epoch_ms: i64) -> i64 {
        let mut timestamp = self.elapsed_ms(epoch_ms);
        while timestamp <= last_timestamp {
            timestamp = self.elapsed_ms(epoch_ms);
        }
        timestamp
    }
}

impl IdGenerator {
    /// Creates a generator with component ID 0, node ID 0, start epoch 2017-01-01T00:00:00Z, and
    /// the system clock.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder initialized with the defaults of [`IdGenerator::new`].
    pub fn builder() -> Builder {
        Builder {
            component_id: 0,
            node_id: 0,
            start_epoch: crate::config::default_start_epoch(),
            time_source: StdSystemTime,
        }
    }

    /// Creates a generator with the system clock from a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::builder().config(config)?.build())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> IdGenerator<T> {
    /// Generates a new ID, or returns an error if the time source reports an instant earlier than
    /// the one used for the previous ID.
    ///
    /// The generator state is left untouched on error, so a later call resumes where the last
    /// successful one left off.
    pub fn next_id(&self) -> Result<Id, ClockRegressionError> {
        let mut state = self.lock_state();
        let last_timestamp = state.last_timestamp;
        let mut timestamp = state.elapsed_ms(self.epoch_ms);

        if timestamp < last_timestamp || timestamp < 0 {
            return Err(ClockRegressionError {
                millis: last_timestamp.max(0).abs_diff(timestamp),
            });
        }

        let sequence = if timestamp == last_timestamp {
            let sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if sequence == 0 {
                trace!(last_timestamp, "sequence exhausted, waiting for next millisecond");
                timestamp = state.til_next_millis(last_timestamp, self.epoch_ms);
            }
            sequence
        } else {
            0
        };

        state.last_timestamp = timestamp;
        state.sequence = sequence;

        // past `epoch_validity()` the high bits are dropped
        Ok(Id::from_fields(
            timestamp as u64 & MAX_TIMESTAMP,
            self.node_id,
            self.component_id,
            sequence,
        ))
    }

    /// Generates a new ID and returns its decimal string representation.
    pub fn next_id_string(&self) -> Result<String, ClockRegressionError> {
        self.next_id().map(String::from)
    }

    /// Generates a new ID, retrying as long as the time source reports an instant earlier than the
    /// one used for the previous ID.
    ///
    /// This method never fails but blocks for as long as the clock stays behind. A start epoch in
    /// the future counts as the clock being behind, so the call blocks until that epoch arrives.
    pub fn next_valid_id(&self) -> Id {
        loop {
            if let Ok(id) = self.next_id() {
                return id;
            }
        }
    }

    /// Generates a new ID with [`next_valid_id`](IdGenerator::next_valid_id) and returns its
    /// decimal string representation.
    pub fn next_valid_id_string(&self) -> String {
        self.next_valid_id().into()
    }

    /// Returns an infinite iterator that produces a new ID for each call of `next()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flaki::IdGenerator;
    ///
    /// IdGenerator::new()
    ///     .iter()
    ///     .enumerate()
    ///     .skip(4)
    ///     .take(4)
    ///     .for_each(|(i, e)| println!("[{i}] {e}"));
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { generator: self }
    }

    fn lock_state(&self) -> sync::MutexGuard<'_, State<T>> {
        // state is committed in one step at the end of `next_id`, so it stays consistent even if
        // the time source panics
        self.state
            .lock()
            .unwrap_or_else(sync::PoisonError::into_inner)
    }
}

impl<T> IdGenerator<T> {
    /// Returns the component ID embedded in generated IDs.
    pub const fn component_id(&self) -> u8 {
        self.component_id
    }

    /// Returns the node ID embedded in generated IDs.
    pub const fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Returns the zero point of the timestamp field.
    pub const fn start_epoch(&self) -> DateTime<Utc> {
        self.start_epoch
    }

    /// Returns the last instant for which the generator produces unique IDs.
    ///
    /// The timestamp field holds 42 bits of milliseconds, i.e. about 139 years after the start
    /// epoch. Past this instant the field overflows and IDs may collide with earlier ones. This is
    /// not checked at generation time.
    pub fn epoch_validity(&self) -> DateTime<Utc> {
        self.start_epoch + Duration::milliseconds(MAX_TIMESTAMP as i64)
    }
}

impl<T> fmt::Debug for IdGenerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("component_id", &self.component_id)
            .field("node_id", &self.node_id)
            .field("start_epoch", &self.start_epoch)
            .finish_non_exhaustive()
    }
}

/// Builds an [`IdGenerator`], validating each option as it is applied.
///
/// Fallible options return `Err` on the first invalid value, so a chain of `?` never yields a
/// half-configured generator.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use flaki::{ConfigError, IdGenerator};
///
/// let g = IdGenerator::builder()
///     .component_id(12)?
///     .node_id(3)?
///     .start_epoch(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())?
///     .build();
/// assert_eq!(g.next_valid_id().component_id(), 12);
///
/// assert_eq!(
///     IdGenerator::builder().node_id(4).unwrap_err(),
///     ConfigError::NodeId(4)
/// );
/// # Ok::<(), ConfigError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Builder<T = StdSystemTime> {
    component_id: u8,
    node_id: u8,
    start_epoch: DateTime<Utc>,
    time_source: T,
}

impl<T> Builder<T> {
    /// Sets the component ID, which must be in `[0, 31]`.
    pub fn component_id(mut self, id: u8) -> Result<Self, ConfigError> {
        if id > MAX_COMPONENT_ID {
            return Err(ConfigError::ComponentId(id));
        }
        self.component_id = id;
        Ok(self)
    }

    /// Sets the node ID, which must be in `[0, 3]`.
    pub fn node_id(mut self, id: u8) -> Result<Self, ConfigError> {
        if id > MAX_NODE_ID {
            return Err(ConfigError::NodeId(id));
        }
        self.node_id = id;
        Ok(self)
    }

    /// Sets the start epoch, which must be between 1970-01-01T00:00:00Z and 2262-01-01T00:00:00Z
    /// inclusive.
    pub fn start_epoch(mut self, epoch: DateTime<Utc>) -> Result<Self, ConfigError> {
        let t = (epoch.timestamp(), epoch.timestamp_subsec_nanos());
        if t < (MIN_START_EPOCH_SECS, 0) || t > (MAX_START_EPOCH_SECS, 0) {
            return Err(ConfigError::StartEpoch(epoch));
        }
        self.start_epoch = epoch;
        Ok(self)
    }

    /// Applies the component ID, node ID, and start epoch of a [`Config`], in that order.
    pub fn config(self, config: &Config) -> Result<Self, ConfigError> {
        self.component_id(config.component_id)?
            .node_id(config.node_id)?
            .start_epoch(config.start_epoch)
    }

    /// Replaces the time source.
    pub fn time_source<U: TimeSource>(self, time_source: U) -> Builder<U> {
        Builder {
            component_id: self.component_id,
            node_id: self.node_id,
            start_epoch: self.start_epoch,
            time_source,
        }
    }
}

impl<T: TimeSource> Builder<T> {
    /// Creates the generator.
    pub fn build(self) -> IdGenerator<T> {
        let g = IdGenerator {
            component_id: self.component_id,
            node_id: self.node_id,
            start_epoch: self.start_epoch,
            epoch_ms: self.start_epoch.timestamp_millis(),
            state: sync::Mutex::new(State {
                last_timestamp: -1,
                sequence: 0,
                time_source: self.time_source,
            }),
        };
        debug!(
            component_id = g.component_id,
            node_id = g.node_id,
            start_epoch = %g.start_epoch,
            epoch_validity = %g.epoch_validity(),
            "id generator built"
        );
        g
    }
}

/// Infinite iterator over the IDs of an [`IdGenerator`], created by [`IdGenerator::iter`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    generator: &'a IdGenerator<T>,
}

impl<T: TimeSource> Iterator for Iter<'_, T> {
    type Item = Id;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generator.next_valid_id())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<T: TimeSource> FusedIterator for Iter<'_, T> {}

impl<'a, T: TimeSource> IntoIterator for &'a IdGenerator<T> {
    type Item = Id;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
