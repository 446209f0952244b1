//! Configuration limits for the task environment.

/// Bounds and thresholds for a [`TaskEnv`](super::TaskEnv).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvConfig {
    /// Upper bound on any single scheduled delay; longer delays clamp here.
    pub max_delay: u64,
    /// Episode ends when total unassigned tasks reach this count.
    pub max_tasks: usize,
    /// Per-step rewards are clamped into `[0, max_reward]`.
    pub max_reward: f64,
    /// Optional episode time limit on cumulative elapsed delay.
    pub max_time: Option<u64>,
    /// Seed for the environment's RNG; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            max_delay: 1000,
            max_tasks: 1000,
            max_reward: 1000.0,
            max_time: None,
            seed: None,
        }
    }
}
