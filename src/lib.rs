//! # Flowmoments
//!
//! Exact, numerically stable streaming central moments for Rust.
//!
//! Flowmoments maintains running means and centralized power sums over a
//! stream without ever rescanning it. Every update is an O(tracked sums)
//! recurrence, and eviction from a trailing window runs the exact algebraic
//! inverse of the insertion it undoes.
//!
//! ## Features
//!
//! - **Univariate moments**: mean and `Σ (x - μ)^k` up to any order
//! - **Joint moments**: `Σ Π_j (x_j - μ_j)^t_j` for arbitrary exponent tuples
//! - **Raw power sums**: `Σ x^k` for signed `k`, plus minimum and maximum
//! - **Windows**: restrict every sum to the last `W` observations
//! - **Decay**: exponential recency weighting instead of uniform weights
//! - **Shared engines**: variance, kurtosis, correlation and friends
//!   subscribe to one engine and read only the sums they need
//!
//! ## Quick Start
//!
//! ```rust
//! use flowmoments::prelude::*;
//!
//! let mut std = Std::new(100);
//! let mut kurtosis = Kurtosis::new(100).unwrap();
//! let core = subscribe::<MomentCore>(&mut [&mut std, &mut kurtosis]).unwrap();
//!
//! for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
//!     core.push(x).unwrap();
//! }
//! println!("std: {}, kurtosis: {}", std.value().unwrap(), kurtosis.value().unwrap());
//! ```
//!
//! ## Concurrency
//!
//! Engines guard their state with a reader-writer lock. The convenience
//! methods lock per call; [`MomentCore::read`](moment::MomentCore::read) and
//! [`MomentCore::write`](moment::MomentCore::write) hand out guards for
//! several operations that must observe the same point in the stream:
//!
//! ```rust
//! use flowmoments::moment::{MomentConfig, MomentCore};
//!
//! let core = MomentCore::new(&MomentConfig::new().with_sums([2, 3])).unwrap();
//! core.push(1.0).unwrap();
//! core.push(4.0).unwrap();
//!
//! let state = core.read();
//! let (m2, m3) = (state.sum(2).unwrap(), state.sum(3).unwrap());
//! assert!(m3.abs() < 1e-12 && m2 > 0.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for configurations and tuples

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod joint;
pub mod math;
pub mod moment;
pub mod power;
pub mod subscription;
pub mod traits;
pub mod tuple;
pub mod window;

pub mod prelude {
    pub use crate::joint::{Correlation, Covariance, EwmCov, JointConfig, JointCore};
    pub use crate::moment::{Kurtosis, Moment, MomentConfig, MomentCore, Skewness, Std};
    pub use crate::power::{Max, Mean, Min, PowerConfig, PowerCore};
    pub use crate::subscription::subscribe;
    pub use crate::traits::*;
    pub use crate::tuple::Tuple;
}

pub use joint::JointCore;
pub use moment::MomentCore;
pub use power::PowerCore;
pub use traits::{ConfigError, StatsError};
pub use tuple::Tuple;
pub use window::Window;
