//! fleetsim - discrete-event multi-robot task assignment.
//!
//! A simulation of heterogeneous robots ("fleet") servicing a stream of
//! Poisson-arriving tasks, paired with a tabular SMDP Q(λ) learner that
//! learns an assignment policy by interacting with the simulation.
//!
//! The environment advances simulated time event-to-event rather than in
//! fixed increments: each [`TaskEnv::step`](env::TaskEnv::step) either
//! performs an immediate assignment (no time passes) or jumps to the next
//! scheduled arrival/completion. The learner encodes structured
//! observations and actions into flat table indices via [`codec::Codec`]
//! and applies variable-time-discounted eligibility-trace updates.

pub mod codec;
pub mod env;
pub mod learner;
pub mod policy;
pub mod robot;
pub mod schedule;
pub mod task;

pub use codec::{Codec, CodecError};
pub use env::{Action, EnvConfig, EnvError, Observation, StepResult, TaskEnv};
pub use learner::{EpisodeStats, LearnerError, QLambdaConfig, SmdpQLambda};
pub use policy::{Policy, RandomPolicy};
pub use robot::{Robot, RobotError};
pub use schedule::{EmptyScheduleError, Event, EventSchedule};
pub use task::{DistComponent, Task, TaskError};
