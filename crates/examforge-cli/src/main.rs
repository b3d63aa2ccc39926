//! examforge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "examforge", version, about = "Blueprint-driven mock test generator")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate tests from a blueprint file or directory
    Generate {
        /// Blueprint file (.json or .toml) or directory of blueprints
        #[arg(long)]
        blueprint: PathBuf,

        /// Question pool directory
        #[arg(long)]
        pool_dir: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Override the blueprint's test id (single file only)
        #[arg(long)]
        test_id: Option<String>,
    },

    /// Validate blueprints against the loaded pools
    Validate {
        /// Blueprint file or directory
        #[arg(long)]
        blueprint: PathBuf,

        /// Question pool directory
        #[arg(long)]
        pool_dir: Option<PathBuf>,
    },

    /// Audit a generated test against its blueprint
    Audit {
        /// Generated test JSON
        #[arg(long)]
        test: PathBuf,

        /// Blueprint the test was generated from
        #[arg(long)]
        blueprint: PathBuf,

        /// Print the audit report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pool statistics and, with a blueprint, test capacity
    Stats {
        /// Question pool directory
        #[arg(long)]
        pool_dir: Option<PathBuf>,

        /// Blueprint to estimate capacity for
        #[arg(long)]
        blueprint: Option<PathBuf>,
    },

    /// Generate a numbered series of tests and report question overlap
    Series {
        /// Blueprint file
        #[arg(long)]
        blueprint: PathBuf,

        /// Number of tests
        #[arg(long, default_value = "3")]
        count: u32,

        /// Test id prefix (default: the blueprint's test id)
        #[arg(long)]
        prefix: Option<String>,

        /// Question pool directory
        #[arg(long)]
        pool_dir: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config, sample pool and example blueprint
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("examforge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Generate {
            blueprint,
            pool_dir,
            output,
            test_id,
        } => commands::generate::execute(blueprint, pool_dir, output, test_id, config),
        Commands::Validate {
            blueprint,
            pool_dir,
        } => commands::validate::execute(blueprint, pool_dir, config),
        Commands::Audit {
            test,
            blueprint,
            json,
        } => commands::audit::execute(test, blueprint, json),
        Commands::Stats {
            pool_dir,
            blueprint,
        } => commands::stats::execute(pool_dir, blueprint, config),
        Commands::Series {
            blueprint,
            count,
            prefix,
            pool_dir,
            output,
        } => commands::series::execute(blueprint, count, prefix, pool_dir, output, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
