//! Command line front end: load a model, run a solver and print the result.
//!
//! Results go to stdout, one entry per state and per line. Logs go to stderr and
//! are filtered with `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser};
use simple_mdp::{
    evaluate_policy_from_config, greedy_policy, policy_iteration_from_config, random_policy,
    read_mdp, read_policy, utils::seeded_rng, value_iteration_from_config, Mdp, SolverConfig
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Solve finite Markov Decision Processes
#[derive(Parser)]
#[command(name = "simple-mdp")]
#[command(about = "Dynamic programming solvers for finite MDPs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Print the dimensions of a model and the actions available in each state
    Info(Info),

    /// Compute the optimal utilities (or the greedy policy) by value iteration
    ValueIteration(ValueIteration),

    /// Compute an optimal policy by policy iteration
    PolicyIteration(PolicyIteration),

    /// Compute the utilities of a policy read from a file
    Evaluate(Evaluate),
}

/// Arguments shared by every solver command.
#[derive(Args)]
struct SolverArgs {
    /// Discount factor, in (0, 1)
    gamma: f64,

    /// Convergence threshold, > 0
    epsilon: f64,

    /// Model file
    mdp_file: PathBuf,

    /// Fail instead of looping more than this many times
    #[arg(long)]
    max_iterations: Option<usize>,
}

impl SolverArgs {
    fn config(&self) -> SolverConfig {
        SolverConfig {
            epsilon: self.epsilon,
            gamma: self.gamma,
            max_iterations: self.max_iterations,
        }
    }

    fn load(&self) -> Result<Mdp> {
        load_mdp(&self.mdp_file)
    }
}

#[derive(Parser)]
struct Info {
    /// Model file
    mdp_file: PathBuf,
}

impl Info {
    fn execute(self) -> Result<()> {
        let mdp = load_mdp(&self.mdp_file)?;

        println!("States: {}", mdp.num_states());
        println!("Actions: {}", mdp.num_actions());
        println!("Start: {}", mdp.start());

        let terminal: Vec<String> = mdp.terminal_states().map(|s| s.to_string()).collect();
        println!("Terminal: {}", terminal.join(" "));

        for state in 0..mdp.num_states() {
            let actions = mdp.available_actions(state);
            let listed: Vec<String> = actions.iter().map(|a| a.to_string()).collect();

            println!("State {}: [{}] {}", state, actions.len(), listed.join(" "));
        }

        Ok(())
    }
}

#[derive(Parser)]
struct ValueIteration {
    #[command(flatten)]
    solver: SolverArgs,

    /// Print the greedy policy instead of the utilities
    #[arg(long)]
    policy: bool,
}

impl ValueIteration {
    fn execute(self) -> Result<()> {
        let mdp = self.solver.load()?;
        let mut values = vec![0.0; mdp.num_states()];

        let sweeps = value_iteration_from_config(&mdp, &self.solver.config(), &mut values)
            .context("value iteration failed")?;
        info!(sweeps, "value iteration finished");

        if self.policy {
            print_policy(&greedy_policy(&mdp, &values)?);
        } else {
            print_values(&values);
        }

        Ok(())
    }
}

#[derive(Parser)]
struct PolicyIteration {
    #[command(flatten)]
    solver: SolverArgs,

    /// Seed of the initial random policy; defaults to the system clock
    #[arg(long)]
    seed: Option<u64>,
}

impl PolicyIteration {
    fn execute(self) -> Result<()> {
        let mdp = self.solver.load()?;
        let mut policy = random_policy(&mdp, &mut seeded_rng(self.seed));

        let rounds = policy_iteration_from_config(&mdp, &self.solver.config(), &mut policy)
            .context("policy iteration failed")?;
        info!(rounds, "policy iteration finished");

        print_policy(&policy);
        Ok(())
    }
}

#[derive(Parser)]
struct Evaluate {
    #[command(flatten)]
    solver: SolverArgs,

    /// Policy file, one action per state
    policy_file: PathBuf,
}

impl Evaluate {
    fn execute(self) -> Result<()> {
        let mdp = self.solver.load()?;
        let policy = read_policy(&self.policy_file, mdp.num_states())
            .with_context(|| format!("failed to load policy from {}", self.policy_file.display()))?;
        let mut values = vec![0.0; mdp.num_states()];

        let sweeps = evaluate_policy_from_config(&policy, &mdp, &self.solver.config(), &mut values)
            .context("policy evaluation failed")?;
        info!(sweeps, "policy evaluation finished");

        print_values(&values);
        Ok(())
    }
}

fn load_mdp(path: &Path) -> Result<Mdp> {
    read_mdp(path).with_context(|| format!("failed to load model from {}", path.display()))
}

fn print_values(values: &[f64]) {
    for value in values {
        println!("{:.6}", value);
    }
}

fn print_policy(policy: &[usize]) {
    for action in policy {
        println!("{}", action);
    }
}

/// Setup logging to stderr, keeping stdout for results
fn setup_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Info(cmd) => cmd.execute(),
        Command::ValueIteration(cmd) => cmd.execute(),
        Command::PolicyIteration(cmd) => cmd.execute(),
        Command::Evaluate(cmd) => cmd.execute(),
    }
}
