//! Bounded history of probe outcomes.

use std::collections::VecDeque;

/// Sliding FIFO window of up/down outcomes, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    entries: VecDeque<bool>,
    capacity: usize,
}

impl HistoryWindow {
    /// Create an empty window holding at most `capacity` outcomes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an outcome, evicting the oldest entries beyond capacity.
    pub fn record(&mut self, up: bool) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(up);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The classifier only escalates once the window is full.
    pub fn is_saturated(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn up_count(&self) -> usize {
        self.entries.iter().filter(|up| **up).count()
    }

    pub fn down_count(&self) -> usize {
        self.entries.len() - self.up_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_until_saturated() {
        let mut window = HistoryWindow::new(3);
        assert!(window.is_empty());

        window.record(true);
        window.record(false);
        assert_eq!(window.len(), 2);
        assert!(!window.is_saturated());

        window.record(true);
        assert!(window.is_saturated());
        assert_eq!(window.down_count(), 1);
        assert_eq!(window.up_count(), 2);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut window = HistoryWindow::new(3);
        for up in [false, true, true, false] {
            window.record(up);
        }
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![true, true, false]);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        for capacity in 1..=12 {
            let mut window = HistoryWindow::new(capacity);
            for i in 0..capacity * 3 {
                window.record(i % 3 != 0);
                assert!(window.len() <= capacity);
                if i + 1 >= capacity {
                    assert_eq!(window.len(), capacity);
                    assert!(window.is_saturated());
                }
            }
        }
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut window = HistoryWindow::new(0);
        window.record(false);
        window.record(true);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![true]);
    }
}
