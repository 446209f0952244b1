// Demonstration: drive the task environment with uniformly random actions.
//
// Run from the repo root:
//   cargo run --example random_actions -- --steps 50 --seed 42

use fleetsim::{Action, Codec, DistComponent, EnvConfig, Policy, RandomPolicy, Robot, TaskEnv};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let steps: usize = arg_value(&args, "--steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let fleet = vec![Robot::new(vec![1.0, 2.0])?, Robot::new(vec![2.0, 1.0])?];
    let incoming = vec![
        DistComponent::new(0, 60.0, 60.0, 10.0)?,
        DistComponent::new(1, 50.0, 55.0, 5.0)?,
    ];
    let mut env = TaskEnv::new(
        fleet,
        incoming,
        2,
        EnvConfig {
            seed: Some(seed),
            ..EnvConfig::default()
        },
    )?;

    let action_codec = Codec::action(env.n_robots(), env.n_types());
    let mut policy = RandomPolicy::new(action_codec.capacity(), Some(seed));

    env.reset();
    for _ in 0..steps {
        let decoded = action_codec.decode(policy.select_action(0))?;
        let action = Action::new(decoded[0], decoded[1]);

        if action.task_type < env.n_types() {
            println!(
                "attempting to assign robot {} to task type {}",
                action.robot, action.task_type
            );
        } else {
            println!("waiting");
        }

        let result = env.step(action)?;
        println!("delay of {}", result.observation.delay);
        println!("reward of {}", result.reward);
        env.render();

        if result.done {
            env.reset();
        }
    }
    env.close();
    Ok(())
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
