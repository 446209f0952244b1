//! Action-selection policies over encoded states.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Selects encoded actions from encoded states.
///
/// States and actions are the flat indices produced by
/// [`Codec`](crate::codec::Codec); the environment's structured `Action`
/// is recovered by decoding.
pub trait Policy: Send + Sync {
    /// Selects an action index for the given encoded state.
    fn select_action(&mut self, state: usize) -> usize;

    /// Human-readable policy name.
    fn name(&self) -> &str;
}

/// Uniformly random action selection.
///
/// A sanity-check baseline: any learned policy should beat it.
#[derive(Debug)]
pub struct RandomPolicy {
    n_actions: usize,
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a random policy over `n_actions` actions.
    pub fn new(n_actions: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { n_actions, rng }
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, _state: usize) -> usize {
        self.rng.gen_range(0..self.n_actions)
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_policy_stays_in_range() {
        let mut policy = RandomPolicy::new(6, Some(1));
        for _ in 0..200 {
            assert!(policy.select_action(0) < 6);
        }
    }

    #[test]
    fn seeded_random_policies_agree() {
        let mut a = RandomPolicy::new(6, Some(7));
        let mut b = RandomPolicy::new(6, Some(7));
        let xs: Vec<usize> = (0..50).map(|_| a.select_action(0)).collect();
        let ys: Vec<usize> = (0..50).map(|_| b.select_action(0)).collect();
        assert_eq!(xs, ys);
    }
}
