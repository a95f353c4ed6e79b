use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "launchplan-cli", version, about = "Launch planning and content calendar CLI")]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch phase timelines
    Phases {
        #[command(subcommand)]
        action: commands::phases::PhasesAction,
    },
    /// Low-energy window checks
    Risk {
        #[command(subcommand)]
        action: commands::risk::RiskAction,
    },
    /// Full launch plan with risk advisories
    Plan(commands::plan::PlanArgs),
    /// Recurrence patterns
    Recur {
        #[command(subcommand)]
        action: commands::recur::RecurAction,
    },
    /// Content calendar placements
    Calendar {
        /// Placement database file (defaults to the data directory)
        #[arg(long, global = true)]
        db: Option<std::path::PathBuf>,
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    let json = cli.json;
    let result = match cli.command {
        Commands::Phases { action } => commands::phases::run(action, json),
        Commands::Risk { action } => commands::risk::run(action, json),
        Commands::Plan(args) => commands::plan::run(args, json),
        Commands::Recur { action } => commands::recur::run(action, json),
        Commands::Calendar { db, action } => commands::calendar::run(action, db, json),
        Commands::Config { action } => commands::config::run(action, json),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "launchplan-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
