use crate::error::AquaforgeError;
use aquaforge_schemas::reading::{Parameter, Reading};
use std::collections::VecDeque;

/// Number of samples a display session keeps by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Capped FIFO of the most recent readings of a display session.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    samples: VecDeque<Reading>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Result<Self, AquaforgeError> {
        if capacity == 0 {
            return Err(AquaforgeError::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        })
    }

    /// Appends a sample, evicting the oldest ones so at most `capacity` remain.
    pub fn push(&mut self, reading: Reading) {
        self.samples.push_back(reading);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.samples.back()
    }

    /// The sample before the latest one, or the latest itself while fewer than two exist.
    pub fn previous(&self) -> Option<&Reading> {
        match self.samples.len() {
            0 => None,
            1 => self.samples.back(),
            n => self.samples.get(n - 2),
        }
    }

    /// Latest minus previous value of `parameter`; zero until two samples carry it.
    pub fn delta(&self, parameter: Parameter) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        match (
            self.latest().and_then(|r| r.value(parameter)),
            self.previous().and_then(|r| r.value(parameter)),
        ) {
            (Some(current), Some(previous)) => current - previous,
            _ => 0.0,
        }
    }

    /// `(index, value)` pairs for one parameter, oldest first.
    pub fn series(&self, parameter: Parameter) -> Vec<(usize, f64)> {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.value(parameter).map(|v| (i, v)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            samples: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
        }
    }
}
