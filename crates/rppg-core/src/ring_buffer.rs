//! Fixed-capacity sample window
//!
//! [`SampleBuffer`] holds the most recent `capacity` samples in arrival
//! order, evicting the oldest first. It is owned exclusively by one pipeline
//! and never shared across sessions.

use std::collections::VecDeque;

use crate::sample::Sample;

/// FIFO ring of the most recent intensity samples
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create a buffer holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one sample, evicting the oldest if the buffer is full.
    ///
    /// Always succeeds; occupancy grows until `capacity` and stays there.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupancy as a fraction of capacity, 0.0 to 1.0
    pub fn fill_ratio(&self) -> f32 {
        self.samples.len() as f32 / self.capacity as f32
    }

    /// Values only, oldest first, for the processing stages
    pub fn values(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Most recently pushed sample, if any
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Drop all samples; capacity is unchanged
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_value(buffer: &mut SampleBuffer, value: f32, index: u64) {
        buffer.push(Sample::new(value, index));
    }

    #[test]
    fn test_fills_to_capacity() {
        let mut buffer = SampleBuffer::new(4);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());

        for i in 0..4 {
            push_value(&mut buffer, i as f32, i);
        }

        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.fill_ratio(), 1.0);
    }

    #[test]
    fn test_never_exceeds_capacity_and_keeps_push_order() {
        // Strictly increasing values: the window read back must always be
        // the last `capacity` pushed values in push order.
        let capacity = 8;
        let mut buffer = SampleBuffer::new(capacity);

        for i in 0..100u64 {
            push_value(&mut buffer, i as f32, i);
            assert!(buffer.len() <= capacity);

            let values = buffer.values();
            let first = (i + 1).saturating_sub(capacity as u64);
            let expected: Vec<f32> = (first..=i).map(|v| v as f32).collect();
            assert_eq!(values, expected);
        }
    }

    #[test]
    fn test_partial_fill_ratio() {
        let mut buffer = SampleBuffer::new(10);
        for i in 0..3 {
            push_value(&mut buffer, 0.5, i);
        }
        assert!((buffer.fill_ratio() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_clear_resets_occupancy() {
        let mut buffer = SampleBuffer::new(5);
        for i in 0..5 {
            push_value(&mut buffer, 1.0, i);
        }
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.fill_ratio(), 0.0);
        assert_eq!(buffer.capacity(), 5);
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn test_latest_tracks_newest_sample() {
        let mut buffer = SampleBuffer::new(3);
        for i in 0..7u64 {
            push_value(&mut buffer, i as f32 * 2.0, i);
            let latest = buffer.latest().expect("buffer not empty");
            assert_eq!(latest.frame_index, i);
        }
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let mut buffer = SampleBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        push_value(&mut buffer, 9.0, 0);
        push_value(&mut buffer, 10.0, 1);
        assert_eq!(buffer.values(), vec![10.0]);
    }
}
