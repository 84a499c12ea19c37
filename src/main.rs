use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use switchboard::config::Config;
use switchboard::logging;
use switchboard::script::{Panels, Script, TranscriptEntry};
use switchboard::steps::{sequence_from_names, StepSequencer};

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Cross-panel event bus and workflow step sequencing")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a built-in panel session and print what went over the bus
    Demo,

    /// Replay a JSON or TOML script of publishes and panel actions
    Replay {
        /// Script file (.json or .toml)
        script: PathBuf,

        /// Print coordinator views after every step
        #[arg(short, long)]
        verbose: bool,
    },

    /// Drive a step sequence and print its progress
    Steps {
        /// Task names, in order
        #[arg(required = true)]
        names: Vec<String>,

        /// Number of forward steps
        #[arg(short, long, default_value_t = 0)]
        forward: usize,

        /// Number of backward steps, taken after the forward ones
        #[arg(short, long, default_value_t = 0)]
        backward: usize,

        /// Flush once at the end
        #[arg(long)]
        flush: bool,
    },

    /// Print JSON Schemas of the wire types
    Schema,

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;
    let logging_handle = logging::init_logging(&config, cli.debug)?;

    match cli.command {
        Commands::Demo => cmd_demo(&config)?,
        Commands::Replay { script, verbose } => cmd_replay(&config, &script, verbose)?,
        Commands::Steps {
            names,
            forward,
            backward,
            flush,
        } => cmd_steps(names, forward, backward, flush).await?,
        Commands::Schema => cmd_schema()?,
        Commands::Config => print!("{}", config.to_toml()?),
    }

    if let Some(log_path) = logging_handle.log_file_path {
        if log_path.exists() {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    Ok(())
}

fn print_entries(entries: &[TranscriptEntry]) {
    for entry in entries {
        println!("  [{}] {}", entry.scope, entry.envelope);
    }
}

fn print_views(panels: &Panels) -> Result<()> {
    let snapshot = serde_json::to_string_pretty(&panels.snapshot())
        .context("Failed to serialize panel views")?;
    println!("{snapshot}");
    Ok(())
}

fn cmd_demo(config: &Config) -> Result<()> {
    let panels = Panels::new(config);
    panels.run(&Script::demo(config))?;

    println!("Published:");
    print_entries(&panels.transcript());
    println!();
    println!("Final views:");
    print_views(&panels)
}

fn cmd_replay(config: &Config, path: &Path, verbose: bool) -> Result<()> {
    let script = Script::load(path)?;
    if script.steps.is_empty() {
        bail!("Script {} has no steps", path.display());
    }

    let panels = Panels::new(config);
    for (n, step) in script.steps.iter().enumerate() {
        panels
            .run_step(step)
            .with_context(|| format!("Step {} failed", n + 1))?;

        println!("Step {}:", n + 1);
        print_entries(&panels.take_transcript());
        if verbose {
            print_views(&panels)?;
        }
    }

    if !verbose {
        println!();
        println!("Final views:");
        print_views(&panels)?;
    }
    Ok(())
}

async fn cmd_steps(names: Vec<String>, forward: usize, backward: usize, flush: bool) -> Result<()> {
    let mut sequencer = StepSequencer::with_steps(sequence_from_names(&names, true));
    let mut feed = sequencer.subscribe();

    // The feed keeps only the latest list, so the printer sees at most the
    // final state of each burst of transitions
    let printer = tokio::spawn(async move {
        let mut last = String::new();
        while feed.changed().await.is_ok() {
            last = feed
                .borrow_and_update()
                .iter()
                .map(|t| format!("{}:{}", t.name, t.status))
                .collect::<Vec<_>>()
                .join(" ");
        }
        last
    });

    println!("start    {}", sequencer.format_progress());
    for _ in 0..forward {
        sequencer.step_forward();
        println!("forward  {}", sequencer.format_progress());
    }
    for _ in 0..backward {
        sequencer.step_backward();
        println!("backward {}", sequencer.format_progress());
    }
    if flush {
        sequencer.flush();
        println!("flush    {}", sequencer.format_progress());
    }

    let (position, total) = sequencer.progress();
    drop(sequencer);

    let last = printer.await.context("Feed printer task failed")?;
    if !last.is_empty() {
        println!("feed     {last}");
    }
    println!("step {} of {}", position + 1, total);
    Ok(())
}

fn cmd_schema() -> Result<()> {
    use switchboard::coordinators::{BreadcrumbView, ConfirmationView, DrawerView};
    use switchboard::events::{
        BreadcrumbTrail, ConfirmationOutcome, ConfirmationRequest, DrawerContent,
        NavigationTarget,
    };
    use switchboard::steps::StepTask;
    use switchboard::EventEnvelope;

    let schemas = serde_json::json!({
        "EventEnvelope": schemars::schema_for!(EventEnvelope),
        "ConfirmationRequest": schemars::schema_for!(ConfirmationRequest),
        "ConfirmationOutcome": schemars::schema_for!(ConfirmationOutcome),
        "DrawerContent": schemars::schema_for!(DrawerContent),
        "BreadcrumbTrail": schemars::schema_for!(BreadcrumbTrail),
        "NavigationTarget": schemars::schema_for!(NavigationTarget),
        "BreadcrumbView": schemars::schema_for!(BreadcrumbView),
        "ConfirmationView": schemars::schema_for!(ConfirmationView),
        "DrawerView": schemars::schema_for!(DrawerView),
        "StepTask": schemars::schema_for!(StepTask),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&schemas).context("Failed to serialize schemas")?
    );
    Ok(())
}
