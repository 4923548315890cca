//! Cooperative task queue
//!
//! Stands in for the host's event loop: work deferred during one turn runs on
//! the next call to [`TaskQueue::run_pending`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, instrument};

use crate::application::ApplicationResult;

/// Deferred unit of work.
pub type Task = Box<dyn FnOnce() -> ApplicationResult<()>>;

#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task` for the next turn.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() -> ApplicationResult<()> + 'static,
    {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Runs one turn: exactly the tasks queued before this call.
    ///
    /// Tasks deferred while the turn runs wait for the next turn. On the first
    /// failing task the error is returned and the rest of the turn is put back
    /// at the front of the queue.
    #[instrument(level = "debug", skip(self))]
    pub fn run_pending(&self) -> ApplicationResult<usize> {
        let mut turn: VecDeque<Task> = std::mem::take(&mut *self.tasks.borrow_mut());
        let mut ran = 0;
        while let Some(task) = turn.pop_front() {
            if let Err(e) = task() {
                let mut tasks = self.tasks.borrow_mut();
                while let Some(rest) = turn.pop_back() {
                    tasks.push_front(rest);
                }
                return Err(e);
            }
            ran += 1;
        }
        debug!(ran, "turn complete");
        Ok(ran)
    }

    /// Runs turns until the queue is empty or `max_turns` is reached.
    pub fn run_until_idle(&self, max_turns: usize) -> ApplicationResult<usize> {
        let mut total = 0;
        for _ in 0..max_turns {
            if self.is_empty() {
                break;
            }
            total += self.run_pending()?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn given_task_deferred_during_turn_when_running_then_waits_for_next_turn() {
        let queue = Rc::new(TaskQueue::new());
        let hits = Rc::new(Cell::new(0));

        let (q, h) = (Rc::clone(&queue), Rc::clone(&hits));
        queue.defer(move || {
            h.set(h.get() + 1);
            let h2 = Rc::clone(&h);
            q.defer(move || {
                h2.set(h2.get() + 10);
                Ok(())
            });
            Ok(())
        });

        assert_eq!(queue.run_pending().unwrap(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.run_pending().unwrap(), 1);
        assert_eq!(hits.get(), 11);
        assert!(queue.is_empty());
    }

    #[test]
    fn given_failing_task_when_running_then_rest_of_turn_is_kept() {
        let queue = TaskQueue::new();
        queue.defer(|| Err(ApplicationError::UnknownAction("boom".to_string())));
        queue.defer(|| Ok(()));

        assert!(queue.run_pending().is_err());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.run_pending().unwrap(), 1);
    }

    #[test]
    fn given_empty_queue_when_running_until_idle_then_returns_zero() {
        let queue = TaskQueue::new();
        assert_eq!(queue.run_until_idle(5).unwrap(), 0);
    }
}
