//! Bounded joint-action history.

use std::collections::VecDeque;

use tracing::trace;

use crate::action::JointAction;

/// Fixed-capacity, most-recent-first sequence of joint actions.
///
/// Index 0 is the joint action taken on the most recent step. Recording a
/// new joint action when the buffer is full evicts the oldest entry first.
/// A capacity of zero keeps the buffer permanently empty.
///
/// # Examples
///
/// ```
/// use qhist::{GroundedAction, HistoryBuffer, JointAction};
///
/// let mut history = HistoryBuffer::new(2);
/// for name in ["a", "b", "c"] {
///     history.record(JointAction::from_actions([GroundedAction::new("p0", name)]));
/// }
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.get(0).unwrap().action(&"p0".into()).unwrap().name, "c");
/// ```
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    entries: VecDeque<JointAction>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Empty buffer holding at most `capacity` joint actions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Clears the buffer. Call once at the start of every episode.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Pushes `joint` to the front, evicting the oldest entry when full.
    ///
    /// Returns the evicted entry so the caller can [`rollback`](Self::rollback)
    /// the push if the surrounding update fails.
    pub fn record(&mut self, joint: JointAction) -> Option<JointAction> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        if evicted.is_some() {
            trace!(capacity = self.capacity, "evicted oldest joint action");
        }
        self.entries.push_front(joint);
        evicted
    }

    /// Undoes the most recent [`record`](Self::record).
    pub fn rollback(&mut self, evicted: Option<JointAction>) {
        if self.capacity == 0 {
            return;
        }
        self.entries.pop_front();
        if let Some(joint) = evicted {
            self.entries.push_back(joint);
        }
    }

    /// Joint action `depth` steps back (0 = most recent).
    #[must_use]
    pub fn get(&self, depth: usize) -> Option<&JointAction> {
        self.entries.get(depth)
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &JointAction> {
        self.entries.iter()
    }

    /// Number of recorded joint actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before the first record of an episode.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of joint actions retained.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::GroundedAction;

    fn step(name: &str) -> JointAction {
        JointAction::from_actions([GroundedAction::new("p0", name), GroundedAction::new("p1", name)])
    }

    fn names(buf: &HistoryBuffer) -> Vec<String> {
        buf.iter()
            .map(|j| j.action(&"p0".into()).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut buf = HistoryBuffer::new(3);
        for i in 0..10 {
            buf.record(step(&format!("s{i}")));
            assert!(buf.len() <= 3);
            assert_eq!(buf.len(), (i + 1).min(3));
        }
    }

    #[test]
    fn test_eviction_order() {
        let mut buf = HistoryBuffer::new(2);
        assert!(buf.record(step("j1")).is_none());
        assert!(buf.record(step("j2")).is_none());
        let evicted = buf.record(step("j3")).unwrap();
        assert_eq!(evicted.action(&"p0".into()).unwrap().name, "j1");
        assert_eq!(names(&buf), vec!["j3", "j2"]);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut buf = HistoryBuffer::new(0);
        assert!(buf.record(step("j1")).is_none());
        assert!(buf.is_empty());
        buf.rollback(None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_rollback_restores_previous_contents() {
        let mut buf = HistoryBuffer::new(2);
        buf.record(step("j1"));
        buf.record(step("j2"));
        let evicted = buf.record(step("j3"));
        buf.rollback(evicted);
        assert_eq!(names(&buf), vec!["j2", "j1"]);

        let mut short = HistoryBuffer::new(3);
        short.record(step("j1"));
        let evicted = short.record(step("j2"));
        short.rollback(evicted);
        assert_eq!(names(&short), vec!["j1"]);
    }

    #[test]
    fn test_reset() {
        let mut buf = HistoryBuffer::new(2);
        buf.record(step("j1"));
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 2);
    }
}
