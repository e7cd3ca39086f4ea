//! Statistics over raw power sums

use core::fmt;

use super::config::PowerConfig;
use super::engine::PowerCore;
use crate::traits::{Metric, Reader, StatsError, Subscriber};

fn reader(reader: &Option<Reader<PowerCore>>) -> Result<&Reader<PowerCore>, StatsError> {
    reader.as_ref().ok_or(StatsError::NotSubscribed)
}

/// Arithmetic mean, `Σ x / Σ x^0`
///
/// With a decay this is the exponentially weighted mean.
#[derive(Clone, Debug)]
pub struct Mean {
    window: usize,
    decay: Option<f64>,
    reader: Option<Reader<PowerCore>>,
}

impl Mean {
    /// Mean over the last `window` values (0 for all)
    pub fn new(window: usize) -> Self {
        Self {
            window,
            decay: None,
            reader: None,
        }
    }

    /// Exponentially weighted mean, newest value weighted by `decay`
    pub fn decayed(decay: f64) -> Self {
        Self {
            window: 0,
            decay: Some(decay),
            reader: None,
        }
    }
}

impl Subscriber<PowerCore> for Mean {
    fn config(&self) -> PowerConfig {
        let config = PowerConfig::new().with_sums([0, 1]).with_window(self.window);
        match self.decay {
            Some(decay) => config.with_decay(decay),
            None => config,
        }
    }

    fn subscribe(&mut self, reader: Reader<PowerCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for Mean {
    fn value(&self) -> Result<f64, StatsError> {
        let state = reader(&self.reader)?.read();
        Ok(state.sum(1)? / state.sum(0)?)
    }
}

impl fmt::Display for Mean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decay {
            Some(decay) => write!(f, "stream.Mean_{{decay:{}}}", decay),
            None => write!(f, "stream.Mean_{{window:{}}}", self.window),
        }
    }
}

/// Smallest value since the last clear
#[derive(Clone, Debug, Default)]
pub struct Min {
    reader: Option<Reader<PowerCore>>,
}

impl Min {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Subscriber<PowerCore> for Min {
    fn config(&self) -> PowerConfig {
        PowerConfig::new()
    }

    fn subscribe(&mut self, reader: Reader<PowerCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for Min {
    fn value(&self) -> Result<f64, StatsError> {
        reader(&self.reader)?.min()
    }
}

impl fmt::Display for Min {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stream.Min")
    }
}

/// Largest value since the last clear
#[derive(Clone, Debug, Default)]
pub struct Max {
    reader: Option<Reader<PowerCore>>,
}

impl Max {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Subscriber<PowerCore> for Max {
    fn config(&self) -> PowerConfig {
        PowerConfig::new()
    }

    fn subscribe(&mut self, reader: Reader<PowerCore>) {
        self.reader = Some(reader);
    }
}

impl Metric for Max {
    fn value(&self) -> Result<f64, StatsError> {
        reader(&self.reader)?.max()
    }
}

impl fmt::Display for Max {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stream.Max")
    }
}
