//! Sharing one engine between several derived metrics
//!
//! Each metric declares the sums, window and decay it needs through
//! [`Subscriber::config`]. [`subscribe`] merges those declarations, builds a
//! single engine from the union and hands every metric a [`Reader`] onto it.
//! Conflicting windows or decays fail here, never on the push path.
//!
//! # Example
//!
//! ```
//! use flowmoments::moment::{Kurtosis, MomentCore, Std};
//! use flowmoments::subscription::subscribe;
//! use flowmoments::traits::Metric;
//!
//! let mut std = Std::new(0);
//! let mut kurtosis = Kurtosis::new(0).unwrap();
//!
//! let core = subscribe::<MomentCore>(&mut [&mut std, &mut kurtosis]).unwrap();
//! for x in [1.0, 2.0, 3.0, 4.0, 8.0] {
//!     core.push(x).unwrap();
//! }
//!
//! assert!(std.value().unwrap() > 0.0);
//! assert!(kurtosis.value().is_ok());
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::traits::{ConfigError, Engine, EngineConfig, Reader, Subscriber};

/// Build one engine for all `subscribers` and attach each of them to it
///
/// The returned [`Arc`] is the owning handle: pushes and clears go through
/// it, while the subscribers only hold readers.
pub fn subscribe<E: Engine>(
    subscribers: &mut [&mut dyn Subscriber<E>],
) -> Result<Arc<E>, ConfigError> {
    let config = merge_configs(subscribers.iter().map(|s| s.config()))?;
    debug!(subscribers = subscribers.len(), ?config, "merged subscriber configs");

    let engine = Arc::new(E::from_config(&config)?);
    for subscriber in subscribers.iter_mut() {
        subscriber.subscribe(Reader::new(Arc::clone(&engine)));
    }
    Ok(engine)
}

/// Fold configs together with [`EngineConfig::merge`]
pub fn merge_configs<C: EngineConfig>(
    configs: impl IntoIterator<Item = C>,
) -> Result<C, ConfigError> {
    let mut configs = configs.into_iter();
    let first = configs.next().ok_or(ConfigError::NoSubscribers)?;
    configs.try_fold(first, |merged, next| merged.merge(&next))
}

/// Windows merge only when identical
pub(crate) fn merge_window(a: usize, b: usize) -> Result<usize, ConfigError> {
    if a != b {
        return Err(ConfigError::WindowMismatch(a, b));
    }
    Ok(a)
}

/// Decays merge only when identical, including both absent
pub(crate) fn merge_decay(a: Option<f64>, b: Option<f64>) -> Result<Option<f64>, ConfigError> {
    if a != b {
        return Err(ConfigError::DecayMismatch(a, b));
    }
    Ok(a)
}

/// Check the weighting scheme shared by both engine kinds
pub(crate) fn validate_weighting(window: usize, decay: Option<f64>) -> Result<(), ConfigError> {
    if let Some(decay) = decay {
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ConfigError::InvalidDecay(decay));
        }
        if window != 0 {
            return Err(ConfigError::DecayWithWindow { window });
        }
    }
    Ok(())
}
