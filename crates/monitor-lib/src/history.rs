//! Bounded per-metric sample history
//!
//! Keeps the recent samples of each metric, newest last, and evicts by time
//! so that the longest sustained-duration window can always be evaluated.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::models::{MetricKind, Sample};

/// Time-bounded sequence of samples for one metric
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<Sample>,
    retention: Duration,
}

impl HistoryBuffer {
    /// Create an empty buffer that keeps samples no older than `retention`
    /// relative to the newest sample
    pub fn new(retention: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Append a sample, then drop everything outside the retention window
    pub fn record(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        self.expire_old_samples(sample.timestamp);
    }

    fn expire_old_samples(&mut self, newest: DateTime<Utc>) {
        let cutoff = newest - self.retention;
        while let Some(front) = self.samples.front() {
            if front.timestamp < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Earliest sample of the run of consecutive samples, ending at the
    /// newest one, that all satisfy `predicate`
    pub fn trailing_run_start<F>(&self, predicate: F) -> Option<&Sample>
    where
        F: Fn(f64) -> bool,
    {
        self.samples
            .iter()
            .rev()
            .take_while(|s| predicate(s.value))
            .last()
    }
}

/// One history buffer per metric
#[derive(Debug, Clone)]
pub struct MetricHistory {
    buffers: HashMap<MetricKind, HistoryBuffer>,
}

impl MetricHistory {
    /// Build buffers from per-metric retention windows
    pub fn new(retention: impl IntoIterator<Item = (MetricKind, Duration)>) -> Self {
        Self {
            buffers: retention
                .into_iter()
                .map(|(metric, window)| (metric, HistoryBuffer::new(window)))
                .collect(),
        }
    }

    /// Record a sample; metrics without a configured buffer are ignored
    pub fn record(&mut self, metric: MetricKind, sample: Sample) {
        if let Some(buffer) = self.buffers.get_mut(&metric) {
            buffer.record(sample);
        }
    }

    pub fn buffer(&self, metric: MetricKind) -> Option<&HistoryBuffer> {
        self.buffers.get(&metric)
    }

    pub fn latest(&self, metric: MetricKind) -> Option<&Sample> {
        self.buffers.get(&metric).and_then(HistoryBuffer::latest)
    }
}
