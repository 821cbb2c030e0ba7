use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use post_task::DelayTable;
use post_task_local::Profile;
use std::path::{Path, PathBuf};

mod simulate;

#[derive(Parser)]
#[command(name = "post-task")]
#[command(about = "Inspect how post-task routes work on different hosts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post one task per priority plus a pause on a simulated host and print the timeline
    Simulate {
        /// Capabilities the simulated host offers
        #[arg(long, value_enum, default_value_t = ProfileName::Timers)]
        profile: ProfileName,
        /// JSON delay table overriding the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the effective delay table as JSON
    Delays {
        /// JSON delay table overriding the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProfileName {
    /// No event loop: everything runs inline
    Batch,
    /// Timers only
    Timers,
    /// Timers and a microtask queue
    Microtasks,
    /// Timers and idle callbacks
    Idle,
    /// Native priority scheduler with yield
    Native,
}

impl From<ProfileName> for Profile {
    fn from(name: ProfileName) -> Self {
        match name {
            ProfileName::Batch => Profile::batch(),
            ProfileName::Timers => Profile::timers(),
            ProfileName::Microtasks => Profile::microtasks(),
            ProfileName::Idle => Profile::idle(),
            ProfileName::Native => Profile::native(),
        }
    }
}

fn load_delays(config: Option<&Path>) -> Result<DelayTable> {
    let Some(path) = config else {
        return Ok(DelayTable::DEFAULT);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading delay table {}", path.display()))?;
    let delays = DelayTable::from_json(&json)
        .with_context(|| format!("parsing delay table {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded delay table");
    Ok(delays)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Simulate { profile, config } => {
            let delays = load_delays(config.as_deref())?;
            println!("profile: {:?}", profile);
            let report = simulate::run((*profile).into(), delays)?;
            print!("{}", report);
        }
        Commands::Delays { config } => {
            let delays = load_delays(config.as_deref())?;
            println!("{}", delays.to_json_pretty()?);
        }
    }

    Ok(())
}
