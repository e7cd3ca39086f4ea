//! Univariate moments of a stream
//!
//! [`MomentCore`] maintains the running mean and centralized power sums
//! `Σ (x - μ)^k` of a single scalar stream, optionally over a trailing window
//! or with exponential decay. The metrics in this module read from a shared
//! core through [`subscribe`](crate::subscription::subscribe).
//!
//! # Example
//!
//! ```
//! use flowmoments::moment::{MomentConfig, MomentCore};
//!
//! let core = MomentCore::new(&MomentConfig::new().with_sums([2]).with_window(3)).unwrap();
//! for x in [1.0, 2.0, 3.0, 4.0, 8.0] {
//!     core.push(x).unwrap();
//! }
//!
//! // Only the last three values are in scope
//! assert!((core.mean().unwrap() - 5.0).abs() < 1e-12);
//! assert!((core.sum(2).unwrap() - 14.0).abs() < 1e-12);
//! ```

mod config;
mod engine;
mod metrics;

pub use self::config::MomentConfig;
pub use self::engine::{MomentCore, MomentReadGuard, MomentState, MomentWriteGuard};
pub use self::metrics::{Kurtosis, Moment, Skewness, Std};
