//! Bucketed, display-ordered view of a task collection.

use super::{Task, TaskStatus};

/// Sorts tasks by priority rank, then by due date ascending.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by_key(Task::sort_key);
}

/// Tasks grouped into their status buckets, each bucket display-ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBoard {
    upcoming: Vec<Task>,
    ongoing: Vec<Task>,
    completed: Vec<Task>,
    missed: Vec<Task>,
}

impl TaskBoard {
    /// Groups and orders `tasks`.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut board = Self::default();
        for task in tasks {
            board.bucket_mut(task.status()).push(task.clone());
        }
        for status in TaskStatus::ALL {
            sort_for_display(board.bucket_mut(status));
        }
        board
    }

    /// Returns the tasks in `status`'s bucket.
    #[must_use]
    pub fn bucket(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Upcoming => &self.upcoming,
            TaskStatus::Ongoing => &self.ongoing,
            TaskStatus::Completed => &self.completed,
            TaskStatus::Missed => &self.missed,
        }
    }

    /// Number of tasks in `status`'s bucket.
    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.bucket(status).len()
    }

    /// Total number of tasks on the board.
    #[must_use]
    pub fn total(&self) -> usize {
        TaskStatus::ALL
            .into_iter()
            .map(|status| self.count(status))
            .sum()
    }

    fn bucket_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Upcoming => &mut self.upcoming,
            TaskStatus::Ongoing => &mut self.ongoing,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Missed => &mut self.missed,
        }
    }
}
