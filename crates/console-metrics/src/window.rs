use std::collections::VecDeque;

use serde::{Serialize, Serializer};

use crate::types::Sample;

/// Number of samples retained per processor.
pub const SERIES_WINDOW: usize = 100;

/// Fixed-capacity FIFO of samples. Pushing past capacity evicts the oldest.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning how many old samples were evicted.
    pub fn push(&mut self, sample: Sample) -> usize {
        self.samples.push_back(sample);

        let mut evicted = 0;
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(SERIES_WINDOW)
    }
}

impl Serialize for SampleWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.samples.iter())
    }
}

/// Samples for one processor, in receipt order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorSeries {
    pub processor: String,
    pub samples: SampleWindow,
}

impl ProcessorSeries {
    pub fn new(processor: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            samples: SampleWindow::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean latency across the window, in milliseconds
    pub fn mean_millis(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.value_seconds * 1000.0).sum();
        Some(sum / self.samples.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: f64, ts: i64) -> Sample {
        Sample {
            processor: "tts".to_string(),
            timestamp_millis: ts,
            value_seconds: value,
        }
    }

    #[test]
    fn push_evicts_oldest_past_capacity() {
        let mut window = SampleWindow::new(3);
        assert_eq!(window.push(sample(0.1, 1)), 0);
        assert_eq!(window.push(sample(0.2, 2)), 0);
        assert_eq!(window.push(sample(0.3, 3)), 0);
        assert_eq!(window.push(sample(0.4, 4)), 1);

        let timestamps: Vec<i64> = window.iter().map(|s| s.timestamp_millis).collect();
        assert_eq!(timestamps, vec![2, 3, 4]);
        assert_eq!(window.latest().map(|s| s.timestamp_millis), Some(4));
    }

    #[test]
    fn default_window_holds_one_hundred_samples() {
        let mut window = SampleWindow::default();
        for i in 0..250 {
            window.push(sample(0.01, i));
        }
        assert_eq!(window.len(), SERIES_WINDOW);
        assert_eq!(window.iter().next().map(|s| s.timestamp_millis), Some(150));
    }

    #[test]
    fn mean_millis_converts_seconds() {
        let mut series = ProcessorSeries::new("tts");
        assert_eq!(series.mean_millis(), None);
        series.samples.push(sample(0.1, 1));
        series.samples.push(sample(0.3, 2));
        let mean = series.mean_millis().expect("mean");
        assert!((mean - 200.0).abs() < 1e-9);
    }
}
