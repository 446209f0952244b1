//! Tasks and the stochastic components that generate them.

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Poisson};
use thiserror::Error;

/// Invalid parameters for a task source.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    #[error("component parameter `{name}` must be finite and non-negative (got {value})")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// An arrived unit of work.
///
/// Immutable once drawn: a task sits in its type's unassigned queue until
/// a robot claims it, then lives in that robot's assignment slot until the
/// completion event fires.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    /// Index of this task's type, `< n_types` of the environment.
    pub task_type: usize,
    /// Work amount; completion delay scales with difficulty over fluency.
    pub difficulty: f64,
    /// Reward paid out on completion.
    pub reward: f64,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(type {}, difficulty {}, reward {})", self.task_type, self.difficulty, self.reward)
    }
}

/// One component of the incoming task distribution.
///
/// A component is a stochastic source for a single task type: it draws
/// Poisson-distributed inter-arrival delays around `mean_delay` and
/// produces [`Task`] instances with its fixed difficulty and reward.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistComponent {
    task_type: usize,
    difficulty: f64,
    mean_delay: f64,
    reward: f64,
}

impl DistComponent {
    /// Creates a component after validating its parameters.
    pub fn new(
        task_type: usize,
        difficulty: f64,
        mean_delay: f64,
        reward: f64,
    ) -> Result<Self, TaskError> {
        for (name, value) in [
            ("difficulty", difficulty),
            ("mean_delay", mean_delay),
            ("reward", reward),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TaskError::InvalidParameter { name, value });
            }
        }
        Ok(Self {
            task_type,
            difficulty,
            mean_delay,
            reward,
        })
    }

    /// Creates a component with the default reward of 1.
    pub fn with_unit_reward(
        task_type: usize,
        difficulty: f64,
        mean_delay: f64,
    ) -> Result<Self, TaskError> {
        Self::new(task_type, difficulty, mean_delay, 1.0)
    }

    /// The task type this component produces.
    pub fn task_type(&self) -> usize {
        self.task_type
    }

    /// Mean inter-arrival delay.
    pub fn mean_delay(&self) -> f64 {
        self.mean_delay
    }

    /// Draws the delay until this component's next arrival.
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> u64 {
        poisson_delay(rng, self.mean_delay)
    }

    /// Produces a task instance of this component's fixed type.
    pub fn draw_task(&self) -> Task {
        Task {
            task_type: self.task_type,
            difficulty: self.difficulty,
            reward: self.reward,
        }
    }
}

/// Samples a Poisson-distributed delay with the given mean.
///
/// `Poisson::new` rejects non-positive means; a zero mean is a legitimate
/// degenerate source here (zero-difficulty work) and yields delay 0.
pub(crate) fn poisson_delay<R: Rng>(rng: &mut R, mean: f64) -> u64 {
    match Poisson::new(mean) {
        Ok(dist) => dist.sample(rng) as u64,
        Err(_) => 0,
    }
}
