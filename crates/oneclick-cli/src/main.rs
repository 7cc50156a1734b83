mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand, ValueEnum};
use oneclick_core::CheckMethod;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "oneclick",
    about = "One-click installer: inspect and change the application's installation state",
    version,
    propagate_version = true
)]
struct Cli {
    /// Application root (default: nearest directory with installer.yaml, else cwd)
    #[arg(long, global = true, env = "ONECLICK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default installer.yaml
    Init {
        /// Installation check method
        #[arg(long, value_enum, default_value = "env")]
        method: MethodArg,

        /// Overwrite an existing installer.yaml
        #[arg(long)]
        force: bool,
    },

    /// Show the installation status
    Status {
        /// Request path to evaluate the redirect decision for
        #[arg(long, default_value = "/")]
        path: String,

        /// Reset the installation status
        #[arg(long, conflicts_with = "mark_installed")]
        reset: bool,

        /// Mark the application as installed
        #[arg(long)]
        mark_installed: bool,
    },

    /// Mark the application as installed and verify the result
    Install,

    /// Print a diagnostic report for the installation check
    Diagnose {
        /// Request path to evaluate the redirect decision for
        #[arg(long, default_value = "/")]
        path: String,
    },

    /// Serve the installer routes in front of a placeholder application
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Env,
    File,
    Database,
}

impl From<MethodArg> for CheckMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Env => CheckMethod::Env,
            MethodArg::File => CheckMethod::File,
            MethodArg::Database => CheckMethod::Database,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { method, force } => cmd::init::run(&root, method.into(), force),
        Commands::Status {
            path,
            reset,
            mark_installed,
        } => cmd::status::run(&root, &path, reset, mark_installed, cli.json),
        Commands::Install => cmd::install::run(&root, cli.json),
        Commands::Diagnose { path } => cmd::diagnose::run(&root, &path, cli.json),
        Commands::Serve { port, no_open } => cmd::serve::run(&root, port, no_open),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
