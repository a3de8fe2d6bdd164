//! Time to script position lookup.
//!
//! A `TimelineIndex` is built once from timing metadata and never mutated;
//! new timing data means a new index. Lookups are `O(log n)`: entries are
//! sorted by start time and carry a running maximum of end times, so the
//! first entry covering `t` is found with two binary searches even when
//! entries overlap.

use crate::show::{SoundCue, TimingEntry};

/// Anything occupying a `[start, end]` span of the show.
pub trait Timed {
    fn start_time(&self) -> f64;
    fn end_time(&self) -> f64;
}

impl Timed for TimingEntry {
    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn end_time(&self) -> f64 {
        self.end_time
    }
}

impl Timed for SoundCue {
    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn end_time(&self) -> f64 {
        self.end_time
    }
}

#[derive(Debug, Clone)]
pub struct TimelineIndex<T> {
    entries: Vec<T>,
    /// `reach[i]` is the largest `end_time` among `entries[..=i]`.
    reach: Vec<f64>,
}

impl<T> Default for TimelineIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            reach: Vec::new(),
        }
    }
}

impl<T: Timed> TimelineIndex<T> {
    /// Build an index. Entries with non-finite times or an empty span are
    /// dropped; the rest are ordered by start time, keeping input order for
    /// equal starts.
    pub fn new(entries: Vec<T>) -> Self {
        let total = entries.len();
        let mut entries: Vec<T> = entries
            .into_iter()
            .filter(|e| {
                let (start, end) = (e.start_time(), e.end_time());
                start.is_finite() && end.is_finite() && end > start
            })
            .collect();
        if entries.len() != total {
            log::warn!(
                "dropped {} timing entries with invalid spans",
                total - entries.len()
            );
        }
        entries.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));

        let mut reach = Vec::with_capacity(entries.len());
        let mut max_end = f64::NEG_INFINITY;
        for e in &entries {
            max_end = max_end.max(e.end_time());
            reach.push(max_end);
        }
        Self { entries, reach }
    }

    /// Index of the entry playing at `time`, if any.
    ///
    /// Bounds are inclusive on both ends. When entries overlap the one with
    /// the earliest start wins. Gaps between entries yield `None`.
    pub fn lookup(&self, time: f64) -> Option<usize> {
        if !time.is_finite() {
            return None;
        }
        // Entries that have started by `time`.
        let started = self.entries.partition_point(|e| e.start_time() <= time);
        // First entry whose span (or an earlier one's) reaches `time`.
        let first = self.reach.partition_point(|&end| end < time);
        // `reach` only jumps at an entry whose own end is the new maximum,
        // so `entries[first]` itself covers `time` when it has started.
        (first < started).then_some(first)
    }

    /// The entry playing at `time`, if any.
    pub fn entry_at(&self, time: f64) -> Option<&T> {
        self.lookup(time).and_then(|i| self.entries.get(i))
    }
}

impl<T> TimelineIndex<T> {
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    /// All indexed entries in lookup order.
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
