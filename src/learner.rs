//! Tabular SMDP Q(λ) with accumulating eligibility traces.
//!
//! The learner owns a dense Q table indexed by (encoded state, encoded
//! action) and a sparse set of active eligibility traces. Because
//! transitions take variable simulated time, the discount is exponentiated
//! by the elapsed delay: a reward reached after a long wait is worth less
//! than the same reward reached immediately.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::codec::{Codec, CodecError};
use crate::env::{Action, EnvError, TaskEnv};
use crate::policy::Policy;

/// Traces below this magnitude are dropped from the active set.
const TRACE_FLOOR: f64 = 1e-12;

/// Failures while driving an environment from the learner.
#[derive(Debug, Error)]
pub enum LearnerError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Hyperparameters for [`SmdpQLambda`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QLambdaConfig {
    /// Learning rate α.
    pub alpha: f64,
    /// Discount γ, exponentiated by elapsed delay per transition.
    pub gamma: f64,
    /// Exploration rate ε.
    pub epsilon: f64,
    /// Trace decay λ.
    pub lambda: f64,
    /// Clear eligibility traces at each episode start. Carrying traces
    /// across episodes lets one episode's updates bleed into the next.
    pub reset_traces_each_episode: bool,
}

impl Default for QLambdaConfig {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            gamma: 0.99,
            epsilon: 0.25,
            lambda: 0.5,
            reset_traces_each_episode: true,
        }
    }
}

/// Summary of one learning episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Decision steps taken.
    pub steps: usize,
    /// Sum of (clamped) rewards.
    pub total_reward: f64,
    /// Simulated time consumed.
    pub time_elapsed: u64,
    /// Whether the episode hit a terminal condition (vs the step budget).
    pub done: bool,
}

impl fmt::Display for EpisodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps {}, reward {:.2}, simulated time {}, {}",
            self.steps,
            self.total_reward,
            self.time_elapsed,
            if self.done { "terminated" } else { "step budget reached" }
        )
    }
}

/// Semi-Markov Q(λ) learner over encoded states and actions.
#[derive(Debug)]
pub struct SmdpQLambda {
    config: QLambdaConfig,
    state_codec: Codec,
    action_codec: Codec,
    n_actions: usize,
    /// Dense Q table, row-major: `q[state * n_actions + action]`.
    q: Vec<f64>,
    /// Active eligibility traces. Entries decay toward zero every update
    /// and are pruned, so this stays far smaller than the Q table.
    traces: HashMap<(usize, usize), f64>,
    rng: StdRng,
}

impl SmdpQLambda {
    /// Creates a learner with zero-initialized tables.
    pub fn new(
        config: QLambdaConfig,
        state_codec: Codec,
        action_codec: Codec,
        seed: Option<u64>,
    ) -> Self {
        let n_states = state_codec.capacity();
        let n_actions = action_codec.capacity();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            state_codec,
            action_codec,
            n_actions,
            q: vec![0.0; n_states * n_actions],
            traces: HashMap::new(),
            rng,
        }
    }

    /// Creates a learner sized to an environment's observation and action
    /// spaces.
    pub fn for_env(config: QLambdaConfig, env: &TaskEnv, seed: Option<u64>) -> Self {
        let state_codec = Codec::observation(env.n_robots(), env.n_types(), env.config().max_tasks);
        let action_codec = Codec::action(env.n_robots(), env.n_types());
        Self::new(config, state_codec, action_codec, seed)
    }

    /// The Q value for an encoded (state, action) pair.
    pub fn q_value(&self, state: usize, action: usize) -> f64 {
        self.q[state * self.n_actions + action]
    }

    /// Codec for environment observations.
    pub fn state_codec(&self) -> &Codec {
        &self.state_codec
    }

    /// Codec for environment actions.
    pub fn action_codec(&self) -> &Codec {
        &self.action_codec
    }

    /// First-encountered argmax over the state's action row.
    fn greedy_action(&self, state: usize) -> usize {
        let row = &self.q[state * self.n_actions..(state + 1) * self.n_actions];
        let mut best = 0;
        for (action, &value) in row.iter().enumerate() {
            if value > row[best] {
                best = action;
            }
        }
        best
    }

    /// ε-greedy selection: greedy with probability `1 - ε`, otherwise
    /// uniform over all actions (the greedy one included).
    pub fn select_action(&mut self, state: usize) -> usize {
        if self.rng.gen::<f64>() < self.config.epsilon {
            self.rng.gen_range(0..self.n_actions)
        } else {
            self.greedy_action(state)
        }
    }

    /// Applies one SMDP Q(λ) update for the transition
    /// `(state, action) --reward, delay--> next_state`.
    ///
    /// The TD error bootstraps from the greedy value of `next_state`,
    /// discounted by `γ^delay`. The visited pair's trace accumulates by 1,
    /// every active trace applies the error weighted by its value, and all
    /// traces then decay by `(γλ)^delay`.
    pub fn update(&mut self, state: usize, action: usize, reward: f64, next_state: usize, delay: u64) {
        let greedy = self.greedy_action(next_state);
        let discount = self.config.gamma.powf(delay as f64);
        let delta =
            reward + discount * self.q_value(next_state, greedy) - self.q_value(state, action);

        *self.traces.entry((state, action)).or_insert(0.0) += 1.0;

        let alpha = self.config.alpha;
        let decay = (self.config.gamma * self.config.lambda).powf(delay as f64);
        let n_actions = self.n_actions;
        let q = &mut self.q;
        self.traces.retain(|&(s, a), trace| {
            q[s * n_actions + a] += alpha * delta * *trace;
            *trace *= decay;
            trace.abs() > TRACE_FLOOR
        });
    }

    /// Clears all eligibility traces.
    pub fn reset_traces(&mut self) {
        self.traces.clear();
    }

    /// Runs one learning episode against `env`, for at most `max_steps`
    /// decision steps.
    ///
    /// Encodes each observation's idle flags and pending counts, selects
    /// an action ε-greedily, decodes and submits it, and updates the
    /// tables from the resulting transition.
    pub fn run_episode(
        &mut self,
        env: &mut TaskEnv,
        max_steps: usize,
    ) -> Result<EpisodeStats, LearnerError> {
        if self.config.reset_traces_each_episode {
            self.reset_traces();
        }

        let obs = env.reset();
        let mut state = self.state_codec.encode(&obs.state_values())?;
        let mut total_reward = 0.0;
        let mut steps = 0;

        for _ in 0..max_steps {
            let action = self.select_action(state);
            let decoded = self.action_codec.decode(action)?;
            let result = env.step(Action::new(decoded[0], decoded[1]))?;

            let next_state = self.state_codec.encode(&result.observation.state_values())?;
            self.update(
                state,
                action,
                result.reward,
                next_state,
                result.observation.delay,
            );

            total_reward += result.reward;
            steps += 1;
            state = next_state;
            if result.done {
                break;
            }
        }

        Ok(EpisodeStats {
            steps,
            total_reward,
            time_elapsed: env.time_elapsed(),
            done: env.is_done(),
        })
    }
}

impl Policy for SmdpQLambda {
    fn select_action(&mut self, state: usize) -> usize {
        SmdpQLambda::select_action(self, state)
    }

    fn name(&self) -> &str {
        "smdp-q-lambda"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvConfig;
    use crate::robot::Robot;
    use crate::task::DistComponent;

    fn small_learner(config: QLambdaConfig) -> SmdpQLambda {
        SmdpQLambda::new(config, Codec::new(vec![4]), Codec::new(vec![3]), Some(1))
    }

    #[test]
    fn tables_start_at_zero() {
        let learner = small_learner(QLambdaConfig::default());
        for s in 0..4 {
            for a in 0..3 {
                assert_eq!(learner.q_value(s, a), 0.0);
            }
        }
        assert!(learner.traces.is_empty());
    }

    #[test]
    fn greedy_selection_breaks_ties_on_first_max() {
        let mut learner = small_learner(QLambdaConfig {
            epsilon: 0.0,
            ..QLambdaConfig::default()
        });
        learner.q[0 * 3 + 1] = 2.0;
        learner.q[0 * 3 + 2] = 2.0;
        assert_eq!(learner.select_action(0), 1);
        // All-zero row selects action 0.
        assert_eq!(learner.select_action(1), 0);
    }

    #[test]
    fn exploration_covers_the_full_action_set() {
        let mut learner = small_learner(QLambdaConfig {
            epsilon: 1.0,
            ..QLambdaConfig::default()
        });
        learner.q[0 * 3 + 1] = 10.0;
        let mut seen = [false; 3];
        for _ in 0..300 {
            seen[learner.select_action(0)] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn update_applies_the_td_error() {
        let config = QLambdaConfig {
            alpha: 0.1,
            gamma: 0.5,
            lambda: 0.5,
            epsilon: 0.0,
            reset_traces_each_episode: true,
        };
        let mut learner = small_learner(config);

        learner.update(1, 2, 5.0, 0, 1);
        // delta = 5 + 0.5 * 0 - 0 = 5; q += alpha * delta * 1.
        assert!((learner.q_value(1, 2) - 0.5).abs() < 1e-12);
        // Trace accumulated to 1, then decayed by (gamma * lambda)^1.
        assert!((learner.traces[&(1, 2)] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn discount_is_exponentiated_by_elapsed_delay() {
        let config = QLambdaConfig {
            alpha: 1.0,
            gamma: 0.5,
            lambda: 0.0,
            epsilon: 0.0,
            reset_traces_each_episode: true,
        };
        let mut learner = small_learner(config);
        learner.q[0 * 3 + 0] = 2.0; // greedy value of next state 0

        learner.update(1, 1, 0.0, 0, 2);
        // delta = 0 + 0.5^2 * 2 - 0 = 0.5
        assert!((learner.q_value(1, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn traces_spread_a_later_reward_backward() {
        let config = QLambdaConfig {
            alpha: 0.1,
            gamma: 1.0,
            lambda: 1.0,
            epsilon: 0.0,
            reset_traces_each_episode: true,
        };
        let mut learner = small_learner(config);

        // First transition earns nothing; its trace stays at 1 (no decay
        // with gamma = lambda = 1).
        learner.update(0, 0, 0.0, 1, 0);
        assert_eq!(learner.q_value(0, 0), 0.0);

        // The second transition's reward reaches the first pair through
        // its eligibility trace.
        learner.update(1, 1, 10.0, 2, 0);
        assert!((learner.q_value(1, 1) - 1.0).abs() < 1e-12);
        assert!((learner.q_value(0, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn decayed_out_traces_are_pruned() {
        let config = QLambdaConfig {
            alpha: 0.1,
            gamma: 0.1,
            lambda: 0.1,
            epsilon: 0.0,
            reset_traces_each_episode: true,
        };
        let mut learner = small_learner(config);
        learner.update(0, 0, 1.0, 1, 0);
        assert!(learner.traces.contains_key(&(0, 0)));
        // Each update decays by (0.01)^delay; a few long transitions push
        // the trace below the floor.
        for _ in 0..8 {
            learner.update(1, 1, 0.0, 1, 2);
        }
        assert!(!learner.traces.contains_key(&(0, 0)));
    }

    fn demo_env(seed: u64) -> TaskEnv {
        TaskEnv::new(
            vec![
                Robot::new(vec![1.0, 2.0]).unwrap(),
                Robot::new(vec![2.0, 1.0]).unwrap(),
            ],
            vec![
                DistComponent::new(0, 60.0, 60.0, 10.0).unwrap(),
                DistComponent::new(1, 50.0, 55.0, 5.0).unwrap(),
            ],
            2,
            EnvConfig {
                max_tasks: 30,
                max_time: Some(500),
                seed: Some(seed),
                ..EnvConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn run_episode_drives_the_environment() {
        let mut env = demo_env(42);
        let mut learner = SmdpQLambda::for_env(QLambdaConfig::default(), &env, Some(7));
        let stats = learner.run_episode(&mut env, 1000).unwrap();
        assert!(stats.steps > 0);
        assert_eq!(stats.done, env.is_done());
        assert!(stats.total_reward >= 0.0);
    }

    #[test]
    fn trace_reset_policy_is_honored() {
        let mut env = demo_env(42);

        let mut resetting = SmdpQLambda::for_env(
            QLambdaConfig {
                reset_traces_each_episode: true,
                ..QLambdaConfig::default()
            },
            &env,
            Some(7),
        );
        resetting.traces.insert((0, 0), 1.0);
        resetting.run_episode(&mut env, 0).unwrap();
        assert!(!resetting.traces.contains_key(&(0, 0)));

        let mut carrying = SmdpQLambda::for_env(
            QLambdaConfig {
                reset_traces_each_episode: false,
                ..QLambdaConfig::default()
            },
            &env,
            Some(7),
        );
        carrying.traces.insert((0, 0), 1.0);
        carrying.run_episode(&mut env, 0).unwrap();
        assert!(carrying.traces.contains_key(&(0, 0)));
    }

    #[test]
    fn seeded_learners_take_identical_trajectories() {
        let run = || {
            let mut env = demo_env(42);
            let mut learner = SmdpQLambda::for_env(QLambdaConfig::default(), &env, Some(3));
            learner.run_episode(&mut env, 500).unwrap()
        };
        assert_eq!(run(), run());
    }
}
