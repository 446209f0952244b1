// Demonstration: train a tabular SMDP Q(lambda) learner on the demo fleet.
//
// Run from the repo root:
//   cargo run --example q_lambda -- --episodes 20 --steps 1000 --seed 42

use fleetsim::{DistComponent, EnvConfig, QLambdaConfig, Robot, SmdpQLambda, TaskEnv};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let steps: usize = arg_value(&args, "--steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let fleet = vec![Robot::new(vec![1.0, 2.0])?, Robot::new(vec![2.0, 1.0])?];
    let incoming = vec![
        DistComponent::new(0, 60.0, 60.0, 10.0)?,
        DistComponent::new(1, 50.0, 55.0, 5.0)?,
    ];
    // A small task cap keeps the tabular state space (and the dense Q
    // table) at a manageable size for a demo.
    let mut env = TaskEnv::new(
        fleet,
        incoming,
        2,
        EnvConfig {
            max_tasks: 40,
            max_time: Some(500),
            seed: Some(seed),
            ..EnvConfig::default()
        },
    )?;

    let mut learner = SmdpQLambda::for_env(QLambdaConfig::default(), &env, Some(seed));
    println!(
        "state space {} x action space {}",
        learner.state_codec().capacity(),
        learner.action_codec().capacity()
    );

    for episode in 0..episodes {
        let stats = learner.run_episode(&mut env, steps)?;
        println!("episode {:>3}: {}", episode, stats);
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
