//! The discrete-event task-assignment environment.
//!
//! Implements the episode loop: an action either assigns an idle robot to
//! a pending task (no simulated time passes) or amounts to waiting, in
//! which case time jumps to the next scheduled arrival or completion.
//!
//! # Lifecycle
//!
//! 1. Build a [`TaskEnv`] from a fleet, an incoming distribution, and an
//!    [`EnvConfig`].
//! 2. Call [`TaskEnv::reset`] to start an episode.
//! 3. Repeatedly call [`TaskEnv::step`] until [`StepResult::done`].
//! 4. Reset again for the next episode.

pub mod config;

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::robot::Robot;
use crate::schedule::{EmptyScheduleError, Event, EventSchedule};
use crate::task::{DistComponent, Task};

pub use config::EnvConfig;

/// Environment construction and stepping failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("fleet must contain at least one robot")]
    EmptyFleet,

    #[error("incoming distribution must contain at least one component")]
    EmptyDistribution,

    #[error("robot {robot} has {got} fluencies, expected one per task type ({expected})")]
    FluencyArity {
        robot: usize,
        got: usize,
        expected: usize,
    },

    #[error("component {component} produces task type {task_type}, but only {n_types} types exist")]
    ComponentTaskType {
        component: usize,
        task_type: usize,
        n_types: usize,
    },

    #[error("robot index {robot} out of range for a fleet of {n_robots}")]
    InvalidRobotIndex { robot: usize, n_robots: usize },

    #[error("task type {task_type} out of range ({n_types} types plus wait)")]
    InvalidTaskType { task_type: usize, n_types: usize },

    #[error("episode is finished; call reset() before stepping")]
    EpisodeFinished,

    #[error(transparent)]
    Schedule(#[from] EmptyScheduleError),
}

/// What a caller sees of the environment state.
///
/// `delay` is the simulated time that passed during the step that produced
/// this observation (0 for an immediate assignment or a fresh reset).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    pub delay: u64,
    /// One flag per robot: 1 = idle, 0 = busy.
    pub fleet_status: Vec<u8>,
    /// Pending unassigned tasks per type.
    pub unassigned_counts: Vec<usize>,
}

impl Observation {
    /// Flattens the observation into the tuple encoded by
    /// [`Codec::observation`](crate::codec::Codec::observation):
    /// idle flags first, then per-type counts. The delay is not part of
    /// the learner's state.
    pub fn state_values(&self) -> Vec<usize> {
        let mut values: Vec<usize> = self.fleet_status.iter().map(|&s| s as usize).collect();
        values.extend(self.unassigned_counts.iter().copied());
        values
    }
}

/// An assignment request: give `robot` the oldest pending task of
/// `task_type`. A `task_type` equal to the environment's type count is the
/// explicit wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Action {
    pub robot: usize,
    pub task_type: usize,
}

impl Action {
    pub fn new(robot: usize, task_type: usize) -> Self {
        Self { robot, task_type }
    }
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Observation after the step.
    pub observation: Observation,
    /// Reward earned this step, clamped into `[0, max_reward]`.
    pub reward: f64,
    /// Whether the episode reached a terminal condition.
    pub done: bool,
    /// True when the action was a no-op (explicit or implicit wait).
    pub waited: bool,
    /// Cumulative simulated time since reset.
    pub time_elapsed: u64,
}

/// The task-assignment environment.
///
/// Owns the fleet, the incoming distribution, the per-type unassigned task
/// queues, the event schedule, and a seedable RNG for every stochastic
/// draw (arrival delays and completion delays).
#[derive(Debug)]
pub struct TaskEnv {
    config: EnvConfig,
    fleet: Vec<Robot>,
    components: Vec<DistComponent>,
    n_types: usize,

    fleet_status: Vec<u8>,
    unassigned: Vec<VecDeque<Task>>,
    unassigned_counts: Vec<usize>,
    schedule: EventSchedule,
    time_elapsed: u64,
    done: bool,
    rng: StdRng,
}

impl TaskEnv {
    /// Builds an environment, validating the fleet and distribution.
    ///
    /// Every robot must carry exactly one (positive) fluency per task type
    /// and every component must produce a type `< n_types`. The returned
    /// environment needs a [`reset`](Self::reset) before stepping.
    pub fn new(
        fleet: Vec<Robot>,
        components: Vec<DistComponent>,
        n_types: usize,
        config: EnvConfig,
    ) -> Result<Self, EnvError> {
        if fleet.is_empty() {
            return Err(EnvError::EmptyFleet);
        }
        if components.is_empty() {
            return Err(EnvError::EmptyDistribution);
        }
        for (robot, r) in fleet.iter().enumerate() {
            if r.fluencies().len() != n_types {
                return Err(EnvError::FluencyArity {
                    robot,
                    got: r.fluencies().len(),
                    expected: n_types,
                });
            }
        }
        for (component, c) in components.iter().enumerate() {
            if c.task_type() >= n_types {
                return Err(EnvError::ComponentTaskType {
                    component,
                    task_type: c.task_type(),
                    n_types,
                });
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let n_robots = fleet.len();
        Ok(Self {
            fleet,
            components,
            n_types,
            fleet_status: vec![1; n_robots],
            unassigned: vec![VecDeque::new(); n_types],
            unassigned_counts: vec![0; n_types],
            schedule: EventSchedule::new(config.max_delay),
            time_elapsed: 0,
            // An episode only exists after reset().
            done: true,
            rng,
            config,
        })
    }

    /// Starts a new episode.
    ///
    /// All robots go idle, the unassigned pools empty out, and a fresh
    /// schedule gets one initial arrival per distribution component.
    pub fn reset(&mut self) -> Observation {
        for robot in &mut self.fleet {
            robot.clear_assignment();
        }
        self.fleet_status = vec![1; self.fleet.len()];
        self.unassigned = vec![VecDeque::new(); self.n_types];
        self.unassigned_counts = vec![0; self.n_types];

        self.schedule = EventSchedule::new(self.config.max_delay);
        for (index, component) in self.components.iter().enumerate() {
            let delay = component.next_delay(&mut self.rng);
            self.schedule.add(delay, Event::Arrival(index));
        }
        self.time_elapsed = 0;
        self.done = false;

        self.observation(0)
    }

    /// Advances the simulation by one decision step.
    ///
    /// A legal assignment marks the robot busy and schedules its
    /// completion; no simulated time passes unless the fleet is then fully
    /// busy or no tasks remain pending. Illegal-but-well-formed actions
    /// (busy robot, empty pool) are reinterpreted as waiting. Waiting pops
    /// the next scheduled event and applies it.
    pub fn step(&mut self, action: Action) -> Result<StepResult, EnvError> {
        if self.done {
            return Err(EnvError::EpisodeFinished);
        }
        if action.robot >= self.fleet.len() {
            return Err(EnvError::InvalidRobotIndex {
                robot: action.robot,
                n_robots: self.fleet.len(),
            });
        }
        if action.task_type > self.n_types {
            return Err(EnvError::InvalidTaskType {
                task_type: action.task_type,
                n_types: self.n_types,
            });
        }

        let waited = self.take_action(action);

        let idle_robots: u64 = self.fleet_status.iter().map(|&s| s as u64).sum();
        let pending: usize = self.unassigned_counts.iter().sum();

        if waited || idle_robots == 0 || pending == 0 {
            let (delay, event) = self.schedule.pop()?;
            self.time_elapsed += delay;

            let mut reward = 0.0;
            match event {
                Event::Arrival(index) => {
                    let component = &self.components[index];
                    let task = component.draw_task();
                    self.unassigned[task.task_type].push_back(task);
                    self.unassigned_counts[task.task_type] += 1;

                    let next = component.next_delay(&mut self.rng);
                    self.schedule.add(next, Event::Arrival(index));
                }
                Event::Completion(robot) => {
                    reward = self.fleet[robot].complete().unwrap_or(0.0);
                    self.fleet_status[robot] = 1;
                }
            }
            let reward = reward.clamp(0.0, self.config.max_reward);

            let total_pending: usize = self.unassigned_counts.iter().sum();
            let mut done = total_pending >= self.config.max_tasks;
            if let Some(max_time) = self.config.max_time {
                if self.time_elapsed >= max_time {
                    done = true;
                }
            }
            self.done = done;

            return Ok(StepResult {
                observation: self.observation(delay),
                reward,
                done,
                waited,
                time_elapsed: self.time_elapsed,
            });
        }

        // Assignment succeeded with idle robots and pending tasks left:
        // no time passes and nothing terminal can have happened.
        Ok(StepResult {
            observation: self.observation(0),
            reward: 0.0,
            done: false,
            waited: false,
            time_elapsed: self.time_elapsed,
        })
    }

    /// Prints a debug dump of the schedule, fleet, and pending pools.
    pub fn render(&self) {
        println!("{}", self);
    }

    /// Releases environment resources. Nothing to do; kept for interface
    /// symmetry with conventional environment APIs.
    pub fn close(&mut self) {}

    /// Attempts the assignment; returns true when the action was a no-op.
    fn take_action(&mut self, action: Action) -> bool {
        if action.task_type < self.n_types
            && self.fleet_status[action.robot] == 1
            && self.unassigned_counts[action.task_type] > 0
        {
            if let Some(task) = self.unassigned[action.task_type].pop_front() {
                self.unassigned_counts[action.task_type] -= 1;
                let delay = self.fleet[action.robot].assign(task, &mut self.rng);
                self.fleet_status[action.robot] = 0;
                self.schedule.add(delay, Event::Completion(action.robot));
                return false;
            }
        }
        true
    }

    fn observation(&self, delay: u64) -> Observation {
        Observation {
            delay,
            fleet_status: self.fleet_status.clone(),
            unassigned_counts: self.unassigned_counts.clone(),
        }
    }

    /// Number of robots in the fleet.
    pub fn n_robots(&self) -> usize {
        self.fleet.len()
    }

    /// Number of task types.
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    /// Configuration this environment was built with.
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Cumulative simulated time since the last reset.
    pub fn time_elapsed(&self) -> u64 {
        self.time_elapsed
    }

    /// True when the episode has terminated (or no episode has started).
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The fleet, in construction order.
    pub fn fleet(&self) -> &[Robot] {
        &self.fleet
    }

    /// Per-robot idle flags (1 = idle).
    pub fn fleet_status(&self) -> &[u8] {
        &self.fleet_status
    }

    /// Per-type pending counts.
    pub fn unassigned_counts(&self) -> &[usize] {
        &self.unassigned_counts
    }

    /// Per-type pending task queues, oldest first.
    pub fn unassigned_tasks(&self) -> &[VecDeque<Task>] {
        &self.unassigned
    }
}

impl fmt::Display for TaskEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "event schedule: {}", self.schedule)?;
        writeln!(f, "time elapsed:   {}", self.time_elapsed)?;
        for (i, robot) in self.fleet.iter().enumerate() {
            writeln!(f, "robot {}: {}", i, robot)?;
        }
        for (t, queue) in self.unassigned.iter().enumerate() {
            write!(f, "type {} pending ({}):", t, self.unassigned_counts[t])?;
            for task in queue {
                write!(f, " {}", task)?;
            }
            writeln!(f)?;
        }
        write!(f, "===")
    }
}
