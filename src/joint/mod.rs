//! Joint moments of several co-observed streams
//!
//! [`JointCore`] tracks one running mean per variable and the joint
//! centralized sums `Σ Π_j (x_j - μ_j)^t_j` for a set of exponent
//! [`Tuple`](crate::Tuple)s, plus every smaller tuple their recurrence
//! depends on.
//!
//! # Example
//!
//! ```
//! use flowmoments::joint::{Correlation, JointCore};
//! use flowmoments::subscription::subscribe;
//! use flowmoments::traits::Metric;
//!
//! let mut corr = Correlation::new(0);
//! let core = subscribe::<JointCore>(&mut [&mut corr]).unwrap();
//!
//! for (x, y) in [(1.0, 3.0), (2.0, 5.0), (3.0, 7.0)] {
//!     core.push(&[x, y]).unwrap();
//! }
//! assert!((corr.value().unwrap() - 1.0).abs() < 1e-12);
//! ```

mod config;
mod engine;
mod metrics;
mod plan;

pub use self::config::JointConfig;
pub use self::engine::{JointCore, JointReadGuard, JointState, JointWriteGuard};
pub use self::metrics::{Correlation, Covariance, EwmCov};
