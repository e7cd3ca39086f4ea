//! Uncentered power sums and extremes of a stream
//!
//! [`PowerCore`] keeps `Σ x^k` for signed powers `k` (so `-1` gives the
//! harmonic sum and `0` the count) together with the running minimum and
//! maximum. It shares the window, decay and subscription model of the moment
//! engines.
//!
//! # Example
//!
//! ```
//! use flowmoments::power::{Max, Mean, PowerCore};
//! use flowmoments::subscription::subscribe;
//! use flowmoments::traits::Metric;
//!
//! let mut mean = Mean::new(0);
//! let mut max = Max::new();
//! let core = subscribe::<PowerCore>(&mut [&mut mean, &mut max]).unwrap();
//! for x in [2.0, 9.0, 4.0] {
//!     core.push(x).unwrap();
//! }
//!
//! assert!((mean.value().unwrap() - 5.0).abs() < 1e-12);
//! assert_eq!(max.value().unwrap(), 9.0);
//! ```

mod config;
mod engine;
mod metrics;

pub use self::config::PowerConfig;
pub use self::engine::{PowerCore, PowerReadGuard, PowerState, PowerWriteGuard};
pub use self::metrics::{Max, Mean, Min};
