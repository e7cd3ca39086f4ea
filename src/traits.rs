//! Core traits and error types
//!
//! Engines ([`MomentCore`](crate::moment::MomentCore),
//! [`JointCore`](crate::joint::JointCore),
//! [`PowerCore`](crate::power::PowerCore)) implement [`Engine`]; derived
//! statistics implement [`Subscriber`] to declare what they need from an
//! engine and [`Metric`] to report a value. Subscribers only ever hold a
//! [`Reader`], which exposes the read side of an engine and nothing else.

use core::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::tuple::Tuple;

/// Error from exponent tuple arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleError {
    /// The two tuples track a different number of variables
    #[error("tuple length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    /// Componentwise subtraction went below zero
    #[error("subtracting {rhs} from {lhs} yields a negative component at index {index}")]
    Negative { lhs: Tuple, rhs: Tuple, index: usize },
    /// A multinomial coefficient does not fit in 64 bits
    #[error("multinomial coefficient of {lhs} over {rhs} overflows")]
    CoefficientOverflow { lhs: Tuple, rhs: Tuple },
}

/// Invariant violation in a window buffer
///
/// These never come from bad input. Seeing one means the engine's
/// bookkeeping is broken and the operation that hit it was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// Pop from an empty buffer
    #[error("window buffer underflow")]
    Underflow,
    /// Push into a buffer that is already at capacity
    #[error("window buffer overflow: capacity {capacity}")]
    Overflow { capacity: usize },
}

/// Error raised while validating or merging engine configurations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Decay must lie strictly between 0 and 1
    #[error("{0} is not a valid decay, must be in (0, 1)")]
    InvalidDecay(f64),
    /// Decay and a window cannot both be set
    ///
    /// Evicting a value from a decayed window would need its weight at
    /// insertion time, which later decay steps have already folded into
    /// every sum. Removal would not be the exact inverse of insertion.
    #[error("decay cannot be combined with a window (window {window})")]
    DecayWithWindow { window: usize },
    /// Univariate orders start at 1
    #[error("{0} is not a positive power sum order")]
    InvalidOrder(u32),
    /// Order (or tuple magnitude) past the range of exact coefficients
    #[error("order {order} exceeds the maximum supported order {max}")]
    OrderTooLarge { order: u32, max: u32 },
    /// Joint tuples need at least one variable
    #[error("exponent tuples must track at least one variable")]
    EmptyTuple,
    /// The all-zero tuple carries no information
    #[error("{0} is the zero tuple, not a power sum")]
    ZeroTuple(Tuple),
    /// A tuple disagrees with the variable count
    #[error("tuple {tuple} has length {found}, expected {expected}")]
    TupleLength {
        tuple: Tuple,
        expected: usize,
        found: usize,
    },
    /// Neither a variable count nor any tuple was given
    #[error("cannot infer the number of variables without tuples")]
    UnknownVariables,
    /// The recurrence needs a sum that was not planned for
    #[error("recurrence depends on untracked sum {0}")]
    UntrackedDependency(Tuple),
    /// Tracked exponents are too large to key collision-free in 64 bits
    #[error("tracked exponents exceed the 64-bit key space")]
    KeySpaceOverflow,
    /// Two subscribers disagree on the window size
    #[error("conflicting windows: {0} vs {1}")]
    WindowMismatch(usize, usize),
    /// Two subscribers disagree on the decay
    #[error("conflicting decays: {0:?} vs {1:?}")]
    DecayMismatch(Option<f64>, Option<f64>),
    /// Two subscribers disagree on the variable count
    #[error("conflicting variable counts: {0} vs {1}")]
    VariablesMismatch(usize, usize),
    /// Subscription needs at least one metric to derive a config from
    #[error("no subscribers to build a core for")]
    NoSubscribers,
    /// Tuple arithmetic failed while planning the recurrence
    #[error(transparent)]
    Tuple(#[from] TupleError),
}

/// Error returned by engine pushes and queries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Query before any observation contributed
    #[error("no values seen yet")]
    NoValues,
    /// Univariate order outside the requested set
    #[error("{0} is not a tracked power sum")]
    UntrackedOrder(u32),
    /// Raw power outside the tracked set
    #[error("{0} is not a tracked power sum")]
    UntrackedPower(i32),
    /// Joint tuple outside the tracked set
    #[error("{0} is not a tracked power sum")]
    UntrackedTuple(Tuple),
    /// Variable index out of range
    #[error("{0} is not a tracked variable")]
    UntrackedVariable(usize),
    /// Wrong number of values pushed into a joint engine
    #[error("tried to push {found} values when core is tracking {expected} variables")]
    Arity { expected: usize, found: usize },
    /// A sample statistic needs more observations than are in scope
    #[error("need at least {needed} values, have {found}")]
    TooFewValues { needed: u64, found: u64 },
    /// Zero cannot be raised to a negative power
    #[error("cannot raise 0 to the negative power {0}")]
    ZeroToNegativePower(i32),
    /// Metric queried before [`subscribe`](crate::subscription::subscribe)
    #[error("metric is not subscribed to a core")]
    NotSubscribed,
    /// Window bookkeeping broke; the push was aborted
    #[error("internal error: {0}")]
    Window(#[from] WindowError),
}

/// `n` as a float, once at least two observations are in scope
///
/// Sample statistics divide by `n - 1`, which is zero for a single value.
pub(crate) fn sample_size(count: u64) -> Result<f64, StatsError> {
    if count < 2 {
        return Err(StatsError::TooFewValues {
            needed: 2,
            found: count,
        });
    }
    Ok(count as f64)
}

/// Configuration accepted by an [`Engine`]
pub trait EngineConfig: Clone + fmt::Debug + Sized {
    /// Union the tracked sums of two configs
    ///
    /// Fails when window, decay or variable count disagree.
    fn merge(&self, other: &Self) -> Result<Self, ConfigError>;
}

/// A shared aggregation engine
///
/// All methods take `&self`; engines synchronize internally so one instance
/// can sit behind an [`Arc`] and serve many readers.
pub trait Engine: Send + Sync + Sized {
    /// Construction input
    type Config: EngineConfig;

    /// Validate `config` and build an empty engine
    fn from_config(config: &Self::Config) -> Result<Self, ConfigError>;

    /// Observations pushed since construction or the last clear
    fn count(&self) -> u64;

    /// Observations currently contributing to the sums
    fn window_count(&self) -> u64;

    /// Reset to the zero state
    fn clear(&self);
}

/// A consumer that reads sums from a shared engine
pub trait Subscriber<E: Engine> {
    /// Sums, window and decay this subscriber needs
    fn config(&self) -> E::Config;

    /// Attach to the engine built for this subscriber
    fn subscribe(&mut self, reader: Reader<E>);
}

/// A derived statistic
pub trait Metric: fmt::Display {
    /// Current value of the statistic
    fn value(&self) -> Result<f64, StatsError>;
}

/// Read-only handle to a shared engine
///
/// Cloning a reader is cheap and never grants write access. Read methods are
/// added per engine type alongside each engine.
pub struct Reader<E> {
    engine: Arc<E>,
}

impl<E> Reader<E> {
    pub(crate) fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: Engine> Reader<E> {
    /// Observations pushed since construction or the last clear
    pub fn count(&self) -> u64 {
        self.engine.count()
    }

    /// Observations currently contributing to the sums
    pub fn window_count(&self) -> u64 {
        self.engine.window_count()
    }
}

impl<E> Clone for Reader<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Reader<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").field("engine", &self.engine).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(StatsError::NoValues.to_string(), "no values seen yet");
        assert_eq!(
            StatsError::UntrackedOrder(10).to_string(),
            "10 is not a tracked power sum"
        );
        assert_eq!(
            StatsError::UntrackedTuple(Tuple::from([3, 1])).to_string(),
            "(3, 1) is not a tracked power sum"
        );
        assert_eq!(
            StatsError::Arity {
                expected: 2,
                found: 3
            }
            .to_string(),
            "tried to push 3 values when core is tracking 2 variables"
        );
        assert_eq!(
            ConfigError::InvalidDecay(1.5).to_string(),
            "1.5 is not a valid decay, must be in (0, 1)"
        );
        assert_eq!(
            ConfigError::OrderTooLarge { order: 70, max: 67 }.to_string(),
            "order 70 exceeds the maximum supported order 67"
        );
        assert_eq!(
            StatsError::TooFewValues { needed: 2, found: 1 }.to_string(),
            "need at least 2 values, have 1"
        );
    }

    #[test]
    fn test_window_error_converts() {
        let err: StatsError = WindowError::Underflow.into();
        assert_eq!(err, StatsError::Window(WindowError::Underflow));
        assert_eq!(err.to_string(), "internal error: window buffer underflow");
    }
}
