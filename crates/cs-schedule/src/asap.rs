//! `AsapQueue` — interrupted occurrences waiting for crew to free up.
//!
//! Kept as a `Vec` sorted so that the most urgent event is *last*: the engine
//! walks it from the back and removes as it goes, which keeps the remaining
//! indices valid.

use cs_core::TaskId;

use crate::event::TaskEvent;

#[derive(Clone, Debug, Default)]
pub struct AsapQueue {
    events: Vec<TaskEvent>,
}

impl AsapQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert in ASAP order.  O(n) worst case.
    pub fn push(&mut self, event: TaskEvent) {
        let at = self.events.partition_point(|e| e.asap_cmp(&event).is_gt());
        self.events.insert(at, event);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&TaskEvent> {
        self.events.get(index)
    }

    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> TaskEvent {
        self.events.remove(index)
    }

    /// Index of the most urgent event for `task`.
    pub fn rposition_task(&self, task: TaskId) -> Option<usize> {
        self.events.iter().rposition(|e| e.task_id() == task)
    }

    /// Least urgent first.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, TaskEvent> {
        self.events.iter_mut()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Empty the queue, least urgent first.
    pub fn take_all(&mut self) -> Vec<TaskEvent> {
        std::mem::take(&mut self.events)
    }
}
