//! Robot state: per-type fluencies and the current assignment.

use std::fmt;

use rand::Rng;
use thiserror::Error;

use crate::task::{poisson_delay, Task};

/// Invalid robot configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RobotError {
    /// Completion delay is difficulty divided by fluency, so a zero (or
    /// negative, or non-finite) fluency is rejected up front.
    #[error("fluency for task type {task_type} must be finite and positive (got {value})")]
    InvalidFluency { task_type: usize, value: f64 },
}

/// A robot with one skill level per task type.
///
/// A robot is either idle or holds exactly one assigned task. Higher
/// fluency for a type means shorter expected completion delays for tasks
/// of that type.
#[derive(Debug, Clone)]
pub struct Robot {
    fluencies: Vec<f64>,
    assigned: Option<Task>,
}

impl Robot {
    /// Creates an idle robot, validating that every fluency is finite and
    /// strictly positive.
    pub fn new(fluencies: Vec<f64>) -> Result<Self, RobotError> {
        for (task_type, &value) in fluencies.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(RobotError::InvalidFluency { task_type, value });
            }
        }
        Ok(Self {
            fluencies,
            assigned: None,
        })
    }

    /// Per-type fluencies.
    pub fn fluencies(&self) -> &[f64] {
        &self.fluencies
    }

    /// True when no task is assigned.
    pub fn is_idle(&self) -> bool {
        self.assigned.is_none()
    }

    /// The currently assigned task, if any.
    pub fn assigned(&self) -> Option<&Task> {
        self.assigned.as_ref()
    }

    /// Assigns `task` and returns the drawn completion delay.
    ///
    /// The delay is Poisson with mean `difficulty / fluency[task_type]`;
    /// zero-difficulty work completes immediately.
    pub fn assign<R: Rng>(&mut self, task: Task, rng: &mut R) -> u64 {
        let mean = task.difficulty / self.fluencies[task.task_type];
        self.assigned = Some(task);
        poisson_delay(rng, mean)
    }

    /// Clears the assignment and returns its reward, or `None` if idle.
    pub fn complete(&mut self) -> Option<f64> {
        self.assigned.take().map(|task| task.reward)
    }

    /// Drops any assignment, returning the robot to idle.
    pub fn clear_assignment(&mut self) {
        self.assigned = None;
    }
}

impl fmt::Display for Robot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fluencies {:?}, assigned ", self.fluencies)?;
        match &self.assigned {
            Some(task) => write!(f, "{}", task),
            None => write!(f, "none"),
        }
    }
}
