use std::collections::VecDeque;

use nalgebra::Point2;

/// One accepted detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HistoryEntry {
    pub center: Point2<f32>,
    pub confidence: f32,
    pub timestamp_ms: u64,
}

/// Fixed-capacity ring of recent detections, oldest evicted first.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrackHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl TrackHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn mean_confidence(&self) -> Option<f32> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f32 = self.iter().map(|e| e.confidence).sum();
        Some(sum / self.entries.len() as f32)
    }

    /// Mean center of the stored entries.
    pub fn mean_center(&self) -> Option<Point2<f32>> {
        if self.entries.is_empty() {
            return None;
        }
        let sum = self
            .iter()
            .fold(Point2::origin(), |acc: Point2<f32>, e| acc + e.center.coords);
        Some(sum / self.entries.len() as f32)
    }
}
