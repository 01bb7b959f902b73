//! Parking Simulation CLI
//!
//! Runs the maneuver headless and reports the outcome.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use park_core::lot::DEFAULT_FILL_RATIO;
use park_core::timestep::FRAME_DT;
use park_core::{DecisionController, ParkingLot, RunSummary, SimConfig, RULE_TABLE};

#[derive(Parser)]
#[command(name = "park_cli")]
#[command(about = "Rule-based parallel parking simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one maneuver until parked, aborted, or out of ticks
    Run {
        /// YAML config file (defaults apply for missing sections)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for parked-car placement
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Probability that a spot holds a parked car
        #[arg(long, default_value_t = DEFAULT_FILL_RATIO)]
        fill: f32,

        /// Use the fixed layout with no parked cars
        #[arg(long, default_value = "false")]
        standard: bool,

        /// Tick cap at 60 ticks per second
        #[arg(long, default_value_t = 6_000)]
        max_ticks: u64,

        /// Write the decision log as JSON
        #[arg(long)]
        log: Option<PathBuf>,

        /// Print the summary as JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the rule table in evaluation order
    Rules,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("park_core=info,park_cli=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, seed, fill, standard, max_ticks, log, json } => {
            let config = match config {
                Some(path) => SimConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => SimConfig::default(),
            };

            let lot = if standard {
                ParkingLot::standard()
            } else {
                ParkingLot::standard().with_random_fill(seed, fill, &config.vehicle)
            };
            info!(seed, fill, standard, parked_cars = lot.obstacles.len(), "lot prepared");

            let mut controller = DecisionController::new(config, lot)?;
            let summary = controller.run(max_ticks, FRAME_DT);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }

            if let Some(path) = log {
                controller
                    .history()
                    .write_json(&path)
                    .with_context(|| format!("writing decision log {}", path.display()))?;
                println!("\nDecision log saved to: {}", path.display());
            }
        }

        Commands::Rules => {
            println!("{:<4} {:<8} {:<22} DESCRIPTION", "#", "PRIORITY", "RULE");
            for (i, rule) in RULE_TABLE.in_evaluation_order().enumerate() {
                println!(
                    "{:<4} {:<8} {:<22} {}",
                    i + 1,
                    format!("{:?}", rule.priority),
                    rule.id,
                    rule.description
                );
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let outcome = if summary.parked() { "PARKED" } else { "NOT PARKED" };
    println!("Outcome:     {} (final phase: {})", outcome, summary.final_phase);
    println!("Ticks:       {} ({:.1}s simulated)", summary.ticks, summary.sim_time);
    println!(
        "Final pose:  x={:.1} y={:.1} angle={:.1}",
        summary.final_pose.x, summary.final_pose.y, summary.final_pose.angle
    );

    println!("\nPhase transitions:");
    for t in &summary.transitions {
        println!("  {:>16} -> {:<16} after {:.2}s", t.from.as_str(), t.to.as_str(), t.elapsed);
    }

    let usage = &summary.usage;
    println!(
        "\nRule usage ({} decisions, {} distinct rules):",
        usage.total_decisions, usage.distinct_rules
    );
    for (rule, count) in &usage.counts {
        let share = *count as f64 / usage.total_decisions.max(1) as f64 * 100.0;
        println!("  {:<22} {:>6}  {:>5.1}%", rule, count, share);
    }
}
