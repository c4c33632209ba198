use std::time::Duration;

/// Handle for a scheduled task, used to cancel it before it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

struct Entry<T> {
    id: TaskId,
    due: Duration,
    task: T,
}

/// Deadline queue over a virtual clock.
///
/// Nothing here sleeps: the owner feeds the clock forward and pulls due
/// tasks one at a time with [`Scheduler::pop_due`]. Each pop moves the clock
/// to that task's deadline, so tasks scheduled while handling a pop are
/// placed relative to the moment they logically ran. Ties fire in the order
/// they were scheduled.
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule_in(&mut self, delay: Duration, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due: self.now + delay,
            task,
        });
        id
    }

    /// Returns false if the task already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn cancel_where<F>(&mut self, mut pred: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.entries.retain(|e| !pred(&e.task));
    }

    /// Remove and return the earliest task due at or before `until`.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)?;
        let entry = self.entries.swap_remove(idx);
        self.now = self.now.max(entry.due);
        Some(entry.task)
    }

    /// Move the clock forward once every due task has been drained.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
impl<T> Scheduler<T> {
    fn pending(&self) -> usize {
        self.entries.len()
    }

    fn is_scheduled(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }
}
