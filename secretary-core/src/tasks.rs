//! In-memory to-do list

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Format of the `time` field on a task
pub const TASK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A recorded to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task: String,
    /// Local time the task was recorded, `YYYY-MM-DD HH:MM`
    pub time: String,
}

impl Task {
    pub fn new(task: impl Into<String>, at: DateTime<Local>) -> Self {
        Self {
            task: task.into(),
            time: at.format(TASK_TIME_FORMAT).to_string(),
        }
    }
}

/// Process-wide task list, independent of chat sessions
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Mutex<Vec<Task>>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a task stamped with the current local time and return the full list
    pub fn add(&self, task: impl Into<String>) -> Vec<Task> {
        self.add_at(task, Local::now())
    }

    pub fn add_at(&self, task: impl Into<String>, at: DateTime<Local>) -> Vec<Task> {
        let mut tasks = self.tasks.lock();
        tasks.push(Task::new(task, at));
        tasks.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}
