//! Time-indexed sample buffer.

use std::fmt;

use contracts::TimedSampleStatus;
use timecode::{FrameRate, FrameTime, FrameTimeWithRate, TimeError};

use crate::CircularBuffer;

/// Blends two samples for a target that falls between their timestamps.
pub trait Interpolator<T> {
    /// `t` is the normalized position in `[0, 1]` between `a` and `b`.
    fn interpolate(&self, a: &T, b: &T, t: f32) -> T;
}

impl<T, F> Interpolator<T> for F
where
    F: Fn(&T, &T, f32) -> T,
{
    fn interpolate(&self, a: &T, b: &T, t: f32) -> T {
        self(a, b, t)
    }
}

/// A bounded buffer of samples ordered by frame time.
///
/// Samples are stored at the buffer's own rate; timestamps at other rates
/// are remapped on insertion. Lookups report how the target relates to the
/// buffered window using [`TimedSampleStatus`] and, whenever any sample is
/// buffered, return a best-effort value even outside the window.
pub struct TimedDataBuffer<T> {
    rate: FrameRate,
    samples: CircularBuffer<(FrameTime, T)>,
    interpolator: Option<Box<dyn Interpolator<T>>>,
}

impl<T> TimedDataBuffer<T> {
    pub fn new(rate: FrameRate, capacity: usize) -> Self {
        Self {
            rate,
            samples: CircularBuffer::new(capacity),
            interpolator: None,
        }
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    /// Change the rate the samples are indexed at. Existing samples are
    /// discarded since their timestamps are no longer comparable.
    pub fn set_frame_rate(&mut self, rate: FrameRate) {
        if rate != self.rate {
            self.samples.clear();
            self.rate = rate;
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Change the capacity; shrinking discards the oldest samples.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.samples.set_capacity(capacity);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Install an interpolator used when a lookup falls between samples.
    /// Without one the nearest sample wins.
    pub fn set_interpolator(&mut self, interpolator: Option<Box<dyn Interpolator<T>>>) {
        self.interpolator = interpolator;
    }

    /// Timestamps of the oldest and newest samples.
    pub fn time_range(&self) -> Option<(FrameTime, FrameTime)> {
        let oldest = self.samples.front().ok()?.0;
        let newest = self.samples.back().ok()?.0;
        Some((oldest, newest))
    }

    /// Add a sample timestamped at another rate.
    pub fn add(&mut self, time: &FrameTimeWithRate, value: T) -> Result<(), TimeError> {
        let time = time.time().remap(&time.rate(), &self.rate)?;
        self.add_at(time, value);
        Ok(())
    }

    /// Add a sample timestamped at the buffer's rate. Out-of-order samples
    /// are inserted in place; a sample at an existing timestamp replaces it.
    pub fn add_at(&mut self, time: FrameTime, value: T) {
        let newest = self.samples.back().ok().map(|(t, _)| *t);
        match newest {
            Some(newest) if time <= newest => {
                let position = self.samples.iter().position(|(t, _)| *t >= time);
                match position {
                    Some(i) if self.samples[i].0 == time => self.samples[i] = (time, value),
                    Some(i) => self.samples.push_index(i, (time, value)),
                    None => self.samples.push_back((time, value)),
                }
            }
            _ => self.samples.push_back((time, value)),
        }
    }

    /// How a lookup at `time` would relate to the buffered window, without
    /// materializing a value.
    pub fn status_at(&self, time: FrameTime) -> TimedSampleStatus {
        let Some((oldest, newest)) = self.time_range() else {
            return TimedSampleStatus::DataMissing;
        };
        if time < oldest {
            TimedSampleStatus::Ahead
        } else if time > newest {
            TimedSampleStatus::Behind
        } else {
            TimedSampleStatus::Ok
        }
    }

    /// Retrieve the sample for `time`.
    ///
    /// Outside the buffered window the nearest boundary sample is still
    /// returned so a consumer can hold the last known value: `Ahead` pairs
    /// with the oldest sample, `Behind` with the newest. Inside the window
    /// the result is the exact sample, the interpolated value when an
    /// interpolator is installed, or the nearest neighbor otherwise.
    pub fn try_get_sample(&self, time: FrameTime) -> (TimedSampleStatus, Option<T>)
    where
        T: Clone,
    {
        let Some((oldest, newest)) = self.time_range() else {
            return (TimedSampleStatus::DataMissing, None);
        };
        if time < oldest {
            let value = self.samples.front().ok().map(|(_, v)| v.clone());
            return (TimedSampleStatus::Ahead, value);
        }
        if time > newest {
            let value = self.samples.back().ok().map(|(_, v)| v.clone());
            return (TimedSampleStatus::Behind, value);
        }

        // In range and non-empty, so a neighbor at or after `time` exists.
        let mut after = 0;
        for (i, (t, _)) in self.samples.iter().enumerate() {
            if *t >= time {
                after = i;
                break;
            }
        }
        let (after_time, after_value) = &self.samples[after];
        if *after_time == time || after == 0 {
            return (TimedSampleStatus::Ok, Some(after_value.clone()));
        }

        let (before_time, before_value) = &self.samples[after - 1];
        if let Some(interpolator) = &self.interpolator {
            let t = position_between(*before_time, *after_time, time);
            let value = interpolator.interpolate(before_value, after_value, t);
            return (TimedSampleStatus::Ok, Some(value));
        }

        // Nearest neighbor; ties go to the earlier sample.
        let t = position_between(*before_time, *after_time, time);
        let value = if t <= 0.5 { before_value } else { after_value };
        (TimedSampleStatus::Ok, Some(value.clone()))
    }

    /// Samples with `from <= time <= to`, oldest first.
    pub fn samples_in_range(
        &self,
        from: FrameTime,
        to: FrameTime,
    ) -> impl Iterator<Item = (FrameTime, &T)> {
        self.samples
            .iter()
            .filter(move |(t, _)| *t >= from && *t <= to)
            .map(|(t, v)| (*t, v))
    }

    /// The newest sample at or before `cutoff`.
    pub fn latest_before(&self, cutoff: FrameTime) -> Option<(FrameTime, &T)> {
        self.samples
            .iter()
            .rev()
            .find(|(t, _)| *t <= cutoff)
            .map(|(t, v)| (*t, v))
    }
}

/// Normalized position of `time` between `a` and `b`, clamped to `[0, 1]`.
fn position_between(a: FrameTime, b: FrameTime, time: FrameTime) -> f32 {
    let frames = |t: FrameTime| t.frame_number() as f64 + t.subframe().as_f64();
    let span = frames(b) - frames(a);
    if span <= 0.0 {
        return 0.0;
    }
    (((frames(time) - frames(a)) / span).clamp(0.0, 1.0)) as f32
}

impl<T> fmt::Debug for TimedDataBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedDataBuffer")
            .field("rate", &self.rate)
            .field("len", &self.samples.len())
            .field("capacity", &self.samples.capacity())
            .field("has_interpolator", &self.interpolator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(times: &[i32]) -> TimedDataBuffer<char> {
        let mut buffer = TimedDataBuffer::new(FrameRate::from_fps(30), 16);
        for (i, t) in times.iter().enumerate() {
            buffer.add_at(FrameTime::new(*t), (b'A' + i as u8) as char);
        }
        buffer
    }

    #[test]
    fn test_empty_buffer_is_missing() {
        let buffer: TimedDataBuffer<char> = TimedDataBuffer::new(FrameRate::from_fps(30), 4);
        assert_eq!(
            buffer.try_get_sample(FrameTime::new(0)),
            (TimedSampleStatus::DataMissing, None)
        );
        assert_eq!(buffer.time_range(), None);
    }

    #[test]
    fn test_window_statuses() {
        let buffer = buffer_with(&[10, 11, 12, 13, 14]);

        // Older than the window: the data was evicted already.
        let (status, value) = buffer.try_get_sample(FrameTime::new(5));
        assert_eq!(status, TimedSampleStatus::Ahead);
        assert_eq!(value, Some('A'));

        // Newer than the window: the data has not arrived.
        let (status, value) = buffer.try_get_sample(FrameTime::new(20));
        assert_eq!(status, TimedSampleStatus::Behind);
        assert_eq!(value, Some('E'));

        let (status, value) = buffer.try_get_sample(FrameTime::new(12));
        assert_eq!(status, TimedSampleStatus::Ok);
        assert_eq!(value, Some('C'));

        assert_eq!(buffer.status_at(FrameTime::new(12)), TimedSampleStatus::Ok);
        assert_eq!(
            buffer.status_at(FrameTime::new(5)),
            TimedSampleStatus::Ahead
        );
    }

    #[test]
    fn test_nearest_neighbor() {
        let mut buffer = TimedDataBuffer::new(FrameRate::from_fps(30), 8);
        buffer.add_at(FrameTime::new(0), 'A');
        buffer.add_at(FrameTime::new(1), 'B');
        buffer.add_at(FrameTime::new(3), 'C');

        let (_, value) = buffer.try_get_sample(FrameTime::from_frames(0.4));
        assert_eq!(value, Some('A'));
        let (_, value) = buffer.try_get_sample(FrameTime::from_frames(0.6));
        assert_eq!(value, Some('B'));
        let (_, value) = buffer.try_get_sample(FrameTime::from_frames(1.25));
        assert_eq!(value, Some('B'));
        let (_, value) = buffer.try_get_sample(FrameTime::from_frames(2.75));
        assert_eq!(value, Some('C'));
        // Ties go to the earlier sample.
        let (_, value) = buffer.try_get_sample(FrameTime::from_frames(2.0));
        assert_eq!(value, Some('B'));
    }

    #[test]
    fn test_interpolation() {
        let mut buffer: TimedDataBuffer<f32> = TimedDataBuffer::new(FrameRate::from_fps(30), 8);
        buffer.set_interpolator(Some(Box::new(|a: &f32, b: &f32, t: f32| {
            a + (b - a) * t
        })));
        buffer.add_at(FrameTime::new(10), 0.0);
        buffer.add_at(FrameTime::new(20), 100.0);

        let (status, value) = buffer.try_get_sample(FrameTime::new(15));
        assert_eq!(status, TimedSampleStatus::Ok);
        assert!((value.unwrap() - 50.0).abs() < 1e-4);

        // Exact hits bypass the interpolator.
        let (_, value) = buffer.try_get_sample(FrameTime::new(20));
        assert_eq!(value, Some(100.0));
    }

    #[test]
    fn test_out_of_order_and_replace() {
        let mut buffer = TimedDataBuffer::new(FrameRate::from_fps(30), 8);
        buffer.add_at(FrameTime::new(1), 'A');
        buffer.add_at(FrameTime::new(3), 'B');
        buffer.add_at(FrameTime::new(2), 'C');
        let times: Vec<i32> = buffer
            .samples_in_range(FrameTime::new(0), FrameTime::new(10))
            .map(|(t, _)| t.frame_number())
            .collect();
        assert_eq!(times, [1, 2, 3]);

        // Same timestamp replaces in place.
        buffer.add_at(FrameTime::new(2), 'D');
        assert_eq!(buffer.len(), 3);
        let (_, value) = buffer.try_get_sample(FrameTime::new(2));
        assert_eq!(value, Some('D'));
    }

    #[test]
    fn test_add_remaps_rate() {
        let mut buffer = TimedDataBuffer::new(FrameRate::from_fps(60), 8);
        let time = FrameTimeWithRate::new(FrameRate::from_fps(30), FrameTime::new(10));
        buffer.add(&time, 'A').unwrap();
        let (status, _) = buffer.try_get_sample(FrameTime::new(20));
        assert_eq!(status, TimedSampleStatus::Ok);
    }

    #[test]
    fn test_samples_in_range() {
        let buffer = buffer_with(&[10, 11, 12, 13, 14]);
        let collect = |from: i32, to: i32| -> Vec<char> {
            buffer
                .samples_in_range(FrameTime::new(from), FrameTime::new(to))
                .map(|(_, v)| *v)
                .collect()
        };

        assert_eq!(collect(8, 12), ['A', 'B', 'C']);
        assert_eq!(collect(11, 13), ['B', 'C', 'D']);
        assert_eq!(collect(13, 18), ['D', 'E']);
        assert!(collect(20, 50).is_empty());
        assert!(collect(0, 5).is_empty());
    }

    #[test]
    fn test_latest_before() {
        let buffer = buffer_with(&[10, 12, 14]);
        let (time, value) = buffer.latest_before(FrameTime::new(13)).unwrap();
        assert_eq!(time.frame_number(), 12);
        assert_eq!(*value, 'B');
        assert!(buffer.latest_before(FrameTime::new(9)).is_none());
    }

    #[test]
    fn test_set_frame_rate_clears() {
        let mut buffer = buffer_with(&[1, 2, 3]);
        buffer.set_frame_rate(FrameRate::from_fps(30));
        assert_eq!(buffer.len(), 3);
        buffer.set_frame_rate(FrameRate::from_fps(60));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_capacity_shrink_keeps_newest() {
        let mut buffer = buffer_with(&[1, 2, 3, 4, 5]);
        buffer.set_capacity(2);
        assert_eq!(
            buffer.time_range(),
            Some((FrameTime::new(4), FrameTime::new(5)))
        );
    }
}
