//! Derived bivariate statistics

use core::fmt;

use super::config::JointConfig;
use super::engine::JointCore;
use crate::traits::{sample_size, Metric, Reader, StatsError, Subscriber};
use crate::tuple::Tuple;

fn reader(reader: &Option<Reader<JointCore>>) -> Result<&Reader<JointCore>, StatsError> {
    reader.as_ref().ok_or(StatsError::NotSubscribed)
}

/// Sample covariance, `S11 / (n - 1)`
///
/// Fails with [`StatsError::TooFewValues`] while fewer than two pairs are in
/// scope.
#[derive(Clone, Debug)]
pub struct Covariance {
    window: usize,
    reader: Option<Reader<JointCore>>,
}

impl Covariance {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            reader: None,
        }
    }
}

impl Subscriber<JointCore> for Covariance {
    fn config(&self) -> JointConfig {
        JointConfig::new().with_sums([[1, 1]]).with_window(self.window)
    }

    fn subscribe(&mut self, reader: Reader<JointCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for Covariance {
    fn value(&self) -> Result<f64, StatsError> {
        let state = reader(&self.reader)?.read();
        let sum = state.sum(&Tuple::from([1, 1]))?;
        let count = sample_size(state.window_count())?;
        Ok(sum / (count - 1.0))
    }
}

impl fmt::Display for Covariance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint.Covariance_{{window:{}}}", self.window)
    }
}

/// Pearson correlation coefficient
#[derive(Clone, Debug)]
pub struct Correlation {
    window: usize,
    reader: Option<Reader<JointCore>>,
}

impl Correlation {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            reader: None,
        }
    }
}

impl Subscriber<JointCore> for Correlation {
    fn config(&self) -> JointConfig {
        JointConfig::new()
            .with_sums([[1, 1], [2, 0], [0, 2]])
            .with_window(self.window)
    }

    fn subscribe(&mut self, reader: Reader<JointCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for Correlation {
    fn value(&self) -> Result<f64, StatsError> {
        let state = reader(&self.reader)?.read();
        let covariance = state.sum(&Tuple::from([1, 1]))?;
        let x_var = state.sum(&Tuple::from([2, 0]))?;
        let y_var = state.sum(&Tuple::from([0, 2]))?;
        Ok(covariance / (x_var * y_var).sqrt())
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint.Correlation_{{window:{}}}", self.window)
    }
}

/// Exponentially weighted covariance
///
/// The most recent pair carries weight `decay`; older pairs fade by
/// `1 - decay` per step.
#[derive(Clone, Debug)]
pub struct EwmCov {
    decay: f64,
    reader: Option<Reader<JointCore>>,
}

impl EwmCov {
    pub fn new(decay: f64) -> Self {
        Self {
            decay,
            reader: None,
        }
    }
}

impl Subscriber<JointCore> for EwmCov {
    fn config(&self) -> JointConfig {
        JointConfig::new().with_sums([[1, 1]]).with_decay(self.decay)
    }

    fn subscribe(&mut self, reader: Reader<JointCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for EwmCov {
    fn value(&self) -> Result<f64, StatsError> {
        reader(&self.reader)?.sum([1, 1])
    }
}

impl fmt::Display for EwmCov {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint.EWMCov_{{decay:{}}}", self.decay)
    }
}
