//! Debounced search bookkeeping: only the latest query may deliver results.

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub(crate) struct SearchTracker {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl SearchTracker {
    /// Supersede any running search and return the new generation.
    pub(crate) fn next(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;
        self.generation
    }

    /// Remember the task serving the current generation.
    pub(crate) fn track(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }

    pub(crate) const fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_generation_wins() {
        let mut tracker = SearchTracker::default();
        let first = tracker.next();
        let second = tracker.next();

        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[tokio::test]
    async fn test_superseded_task_is_aborted() {
        let mut tracker = SearchTracker::default();
        tracker.next();
        let task = tokio::spawn(std::future::pending::<()>());
        let abort = task.abort_handle();
        tracker.track(task);

        tracker.next();
        for _ in 0..10 {
            if abort.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abort.is_finished());
    }
}
