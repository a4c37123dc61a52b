// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use weigh_in::{execute, Command, Config, Overrides};

#[derive(Parser)]
#[command(name = "weigh-in", version)]
#[command(about = "Weight-loss contest registry and leaderboard")]
#[command(
    after_help = "Environment:\n  WEIGH_IN_DATA_FILE               Snapshot file (default contestants.json)\n  WEIGH_IN_CALCULATOR              External calculator program\n  WEIGH_IN_CALCULATOR_TIMEOUT_MS   Calculator wait per call (default 5000)\n  RUST_LOG                         Log filter (default warn)"
)]
struct Cli {
    /// Snapshot file holding all contestants
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,
    /// External calculator program
    #[arg(long, global = true)]
    calculator: Option<PathBuf>,
    #[arg(long, global = true)]
    calculator_timeout_ms: Option<u64>,
    /// Defaults to the leaderboard UI
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a contestant at their starting weight
    Add {
        name: String,
        #[arg(allow_hyphen_values = true)]
        weight: String,
        /// Date of birth, YYYY-MM-DD
        dob: String,
    },
    /// Record a contestant's current weight
    Update {
        name: String,
        #[arg(allow_hyphen_values = true)]
        weight: String,
    },
    /// Change date of birth and/or weights
    Edit {
        name: String,
        #[arg(long)]
        dob: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        starting_weight: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        current_weight: Option<String>,
    },
    Delete {
        name: String,
    },
    /// Contestant names in registration order
    List,
    Info {
        name: String,
    },
    /// Leaderboard by percentage of weight lost
    Rankings,
    /// Interactive leaderboard
    Ui,
}

impl Commands {
    fn into_command(self) -> Option<Command> {
        Some(match self {
            Commands::Add { name, weight, dob } => Command::Add { name, weight, dob },
            Commands::Update { name, weight } => Command::Update { name, weight },
            Commands::Edit {
                name,
                dob,
                starting_weight,
                current_weight,
            } => Command::Edit {
                name,
                dob,
                starting_weight,
                current_weight,
            },
            Commands::Delete { name } => Command::Delete { name },
            Commands::List => Command::List,
            Commands::Info { name } => Command::Info { name },
            Commands::Rankings => Command::Rankings,
            Commands::Ui => return None,
        })
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::from_env()?.with_overrides(Overrides {
        data_file: cli.data_file,
        calculator: cli.calculator,
        calculator_timeout_ms: cli.calculator_timeout_ms,
    });

    match cli.command.and_then(Commands::into_command) {
        Some(command) => run_command(&config, command),
        None => {
            // UI mode (default)
            run_ui_mode(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One JSON line on stdout; exit code 1 for error responses
fn run_command(config: &Config, command: Command) -> Result<ExitCode> {
    let registry = config.open_registry();
    let response = execute(&registry, command);

    println!("{}", serde_json::to_string(&response)?);

    Ok(if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let registry = config.open_registry();
    let mut app = ui::App::new(registry.rankings(), config.data_file.display().to_string());
    ui::run_ui(&mut app, &registry)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use a subcommand: weigh-in rankings");
    std::process::exit(1);
}
